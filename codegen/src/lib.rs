mod attr;

use attr::ModuleAttr;
use proc_macro::TokenStream;
use quote::{quote, format_ident};
use regex::Regex;
use convert_case::{Case, Casing};

/// Turns a plain struct of module parameters into an `XxxArg` type plus a
/// `Module<XxxArg>` alias, registers the declared ports in order and generates
/// one `<name>_pn(..)` function per port pattern.
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemStruct);
    let attr = syn::parse_macro_input!(attr as ModuleAttr);

    let struct_name = &input.ident;
    let struct_name_scase = struct_name.to_string().to_case(Case::Snake);

    let attrs = &input.attrs;

    let user_fields = match &input.fields {
        syn::Fields::Named(fields_named) => &fields_named.named,
        _ => panic!("Module struct must have named fields"),
    };

    let arg_struct_name = format_ident!("{}Arg", struct_name);

    let mut port_name_functions = Vec::new();
    let mut add_port_codes = Vec::new();
    for port_define in attr.ports.iter() {
        let function_name = format_ident!("{}_pn", port_define.name);
        let direction = &port_define.direction;
        let format_arg = port_define.pattern.clone();

        let fields: Vec<_> = extract_placeholders(&port_define.pattern)
            .into_iter()
            .map(|f| format_ident!("{}", f))
            .collect();

        let code = quote! {
            pub fn #function_name(#(#fields: usize),*) -> crate::circuit::ShrString {
                crate::format_shr!(#format_arg, #(#fields = #fields),*)
            }
        };
        port_name_functions.push(code);

        match (&port_define.collector, fields.len()) {
            (Some(collector), _) => {
                add_port_codes.push(quote! {
                    let names: Vec<crate::circuit::ShrString> = module.#collector();
                    for name in names {
                        module.add_port(name, crate::circuit::PortDirection::#direction)?;
                    }
                });
            }
            (None, 0) => {
                add_port_codes.push(quote! {
                    module.add_port(#struct_name::#function_name(), crate::circuit::PortDirection::#direction)?;
                });
            }
            // Indexed pattern without a collector: only the name function is generated,
            // another group lists these ports
            (None, _) => {}
        }
    }

    // doc comments do not hide a field from the module name, any other attribute does
    let explicit_field_names: Vec<_> = user_fields.iter()
        .filter(|f| f.attrs.iter().all(|a| a.path().is_ident("doc")))
        .map(|f| &f.ident)
        .collect();

    let module_name_code = if explicit_field_names.is_empty() {
        quote! { crate::format_shr!("{}", #struct_name_scase) }
    } else {
        quote! {
            use crate::circuit::NameSegment;
            let segments: Vec<String> = vec![ #(self.#explicit_field_names.name_segment()),* ];
            crate::format_shr!("{}_{}", #struct_name_scase, segments.join("_"))
        }
    };

    quote! {
        #[derive(Debug, Clone, derive_new::new)]
        pub struct #arg_struct_name {
            #user_fields
        }

        #(#attrs)*
        pub type #struct_name = crate::circuit::Module<#arg_struct_name>;

        impl crate::circuit::ModuleArg for #arg_struct_name {
            fn create_module(self, factory: &mut crate::circuit::CircuitFactory) -> crate::LpRamResult<#struct_name> {
                let name = self.module_name();
                let mut module = #struct_name::new(name, self);
                #(#add_port_codes)*
                module.build(factory)?;
                Ok(module)
            }

            fn module_name(&self) -> crate::circuit::ShrString {
                #module_name_code
            }
        }

        impl crate::circuit::Module<#arg_struct_name> {
            #(#port_name_functions)*
        }
    }.into()
}

fn extract_placeholders(s: &str) -> Vec<String> {
    let re = Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").unwrap();
    re.captures_iter(s)
        .map(|cap| cap[1].to_string())
        .collect()
}
