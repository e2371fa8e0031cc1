use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use syn::{parse2, spanned::Spanned, Error, ItemFn, Visibility};

pub fn native<S>(name: String, s: S) -> TokenStream
where
    TokenStream: From<S>,
{
    match expand(name, TokenStream::from(s)) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(name: String, tokens: TokenStream) -> syn::Result<TokenStream> {
    let mut func: ItemFn = parse2(tokens)?;

    if func.sig.inputs.is_empty() {
        return Err(Error::new(
            func.sig.span(),
            "a native takes the call list as its first parameter",
        ));
    }

    let ident = func.sig.ident.clone();
    let vis = std::mem::replace(&mut func.vis, Visibility::Inherited);
    let name = if name.is_empty() {
        ident.to_string()
    } else {
        name
    };

    let n = func.sig.inputs.len() - 1;
    let arity = Literal::usize_unsuffixed(n);
    let args: Vec<_> = (0..n).map(|i| format_ident!("arg{}", i)).collect();
    let indices = (1..=n).map(Literal::usize_unsuffixed);

    Ok(quote! {
        #vis fn #ident() -> (SmolStr, Rc<dyn Extension>) {
            #func

            struct Ext;

            impl Extension for Ext {
                fn call(&self, list: &List, ns: &Namespace<'_>) -> RFunc {
                    expect_arity(list, #arity)?;
                    #(
                        let #args = eval_arg(list, #indices, ns)?;
                    )*

                    #ident(list, #(&#args),*)
                }
            }

            (#name.into(), Rc::new(Ext))
        }
    })
}
