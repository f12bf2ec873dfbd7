//! Console command attribute macro implementation

use darling::{ast::NestedMeta, FromMeta};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse::Parse, parse::ParseStream, Ident, ItemFn, LitStr, Token};

/// Arguments to the console_command attribute
///
/// Usage:
/// - `#[console_command("css_spawns", "Generate extra spawns")]`
/// - `#[console_command("css_reload", "Reload configs", server_only)]`
pub struct ConsoleCommandArgs {
    /// Command name (e.g., "css_spawns")
    pub name: LitStr,
    /// Command description
    pub description: LitStr,
    /// Trailing `key = value` options, parsed with darling
    pub options: TokenStream,
}

/// Optional settings after the name and description
#[derive(Debug, Default, FromMeta)]
pub struct CommandOptions {
    /// Only callable from the server console
    #[darling(default)]
    pub server_only: bool,
}

impl Parse for ConsoleCommandArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name: LitStr = input.parse()?;
        input.parse::<Token![,]>()?;
        let description: LitStr = input.parse()?;

        let options = if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            input.parse::<TokenStream>()?
        } else {
            TokenStream::new()
        };

        Ok(Self {
            name,
            description,
            options,
        })
    }
}

impl ConsoleCommandArgs {
    fn parse_options(&self) -> darling::Result<CommandOptions> {
        if self.options.is_empty() {
            return Ok(CommandOptions::default());
        }
        let list = NestedMeta::parse_meta_list(self.options.clone())?;
        CommandOptions::from_list(&list)
    }
}

/// Generate the console_command implementation
pub fn generate_console_command(args: ConsoleCommandArgs, func: ItemFn) -> TokenStream {
    let options = match args.parse_options() {
        Ok(options) => options,
        Err(err) => return err.write_errors(),
    };

    let fn_name = &func.sig.ident;
    let fn_vis = &func.vis;
    let fn_block = &func.block;
    let fn_attrs = &func.attrs;
    let inputs = &func.sig.inputs;

    if inputs.len() != 2 {
        return syn::Error::new_spanned(
            &func.sig,
            "console commands take `(player: Option<&PlayerInfo>, info: &CommandInfo)`",
        )
        .to_compile_error();
    }

    let command_name = &args.name;
    let command_desc = &args.description;
    let server_only = options.server_only;

    let key_static_name = Ident::new(
        &format!("__{}_COMMAND_KEY", fn_name.to_string().to_uppercase()),
        fn_name.span(),
    );
    let register_fn_name = Ident::new(&format!("{}_register", fn_name), fn_name.span());
    let unregister_fn_name = Ident::new(&format!("{}_unregister", fn_name), fn_name.span());

    let mut params = inputs.iter();
    let player_param = params.next();
    let info_param = params.next();

    quote! {
        static #key_static_name: ::std::sync::Mutex<Option<::cs2modes_core::commands::CommandKey>> =
            ::std::sync::Mutex::new(None);

        #(#fn_attrs)*
        #fn_vis fn #fn_name(#player_param, #info_param) -> ::cs2modes_core::commands::CommandResult #fn_block

        /// Register this command with the command system
        #fn_vis fn #register_fn_name() -> Option<::cs2modes_core::commands::CommandKey> {
            let key = ::cs2modes_core::commands::register_command_ex(
                #command_name,
                #command_desc,
                #server_only,
                #fn_name,
            )?;
            if let Ok(mut slot) = #key_static_name.lock() {
                *slot = Some(key);
            }
            Some(key)
        }

        /// Unregister this command
        #fn_vis fn #unregister_fn_name() -> bool {
            let key = #key_static_name.lock().ok().and_then(|mut slot| slot.take());
            match key {
                Some(key) => ::cs2modes_core::commands::unregister_command(key),
                None => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: TokenStream) -> ConsoleCommandArgs {
        syn::parse2(tokens).unwrap()
    }

    #[test]
    fn test_parse_name_and_description() {
        let parsed = args(quote!("css_spawns", "Generate extra spawns"));
        assert_eq!(parsed.name.value(), "css_spawns");
        assert_eq!(parsed.description.value(), "Generate extra spawns");
        assert!(!parsed.parse_options().unwrap().server_only);
    }

    #[test]
    fn test_parse_server_only() {
        let parsed = args(quote!("css_reload", "Reload", server_only));
        assert!(parsed.parse_options().unwrap().server_only);

        let parsed = args(quote!("css_reload", "Reload", server_only = false));
        assert!(!parsed.parse_options().unwrap().server_only);
    }

    #[test]
    fn test_unknown_option_is_error() {
        let parsed = args(quote!("css_ban", "Ban", permission = "@css/ban"));
        assert!(parsed.parse_options().is_err());
    }

    #[test]
    fn test_generated_names() {
        let func: ItemFn = syn::parse_quote! {
            fn cmd_spawns(player: Option<&PlayerInfo>, info: &CommandInfo) -> CommandResult {
                CommandResult::Handled
            }
        };
        let output = generate_console_command(args(quote!("css_spawns", "desc")), func).to_string();

        assert!(output.contains("cmd_spawns_register"));
        assert!(output.contains("cmd_spawns_unregister"));
        assert!(output.contains("__CMD_SPAWNS_COMMAND_KEY"));
    }
}
