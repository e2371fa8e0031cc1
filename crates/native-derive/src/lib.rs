use proc_macro::TokenStream;

extern crate proc_macro;

mod native;

/// Turns `fn name(list: &List, a: &TVal, ...) -> RFunc` into a constructor
/// `fn name() -> (SmolStr, Rc<dyn Extension>)` for an eager, fixed-arity
/// native. The attribute is the registered name; it defaults to the function's.
#[proc_macro_attribute]
pub fn native(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = attr.to_string().replace(' ', "");
    native::native(attr, item).into()
}
