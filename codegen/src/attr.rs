use syn::{parse::{Parse, ParseStream}, Ident, LitStr, Token};

pub struct ModuleAttr {
    pub ports: Vec<PortDefine>,
}

// bitline: ("bl_{port}_{col}", InOut, all_bitline_names),
pub struct PortDefine {
    pub name: Ident,               // bitline / wordline
    pub pattern: String,           // "bl_{port}_{col}"
    pub direction: Ident,          // Input / InOut / Power / Ground
    pub collector: Option<Ident>,  // method listing every port of the group, in pin order
}

impl Parse for ModuleAttr {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut ports = Vec::new();
        while !input.is_empty() {
            let name: Ident = input.parse()?;
            let _: Token![:] = input.parse()?;
            let content;
            syn::parenthesized!(content in input);
            let pattern: LitStr = content.parse()?;
            let _: Token![,] = content.parse()?;
            let direction: Ident = content.parse()?;

            let collector = if content.peek(Token![,]) {
                let _: Token![,] = content.parse()?;
                Some(content.parse::<Ident>()?)
            } else {
                None
            };

            ports.push(PortDefine { name, pattern: pattern.value(), direction, collector });

            // optional trailing comma
            let _ = input.parse::<Token![,]>();
        }
        Ok(ModuleAttr { ports })
    }
}
