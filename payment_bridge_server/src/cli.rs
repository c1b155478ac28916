use std::{env, env::VarError};

const README: &str = include_str!("./cli-help.txt");

/// Environment variables that are shown with `--help`. Secrets (the gateway secret, retired keys and the Shopify
/// access token) are deliberately absent.
pub const DISPLAY_ENVS: [&str; 19] = [
    "RUST_LOG",
    "PGB_HOST",
    "PGB_PORT",
    "PGB_DATABASE_URL",
    "PGB_MAX_TENANTS",
    "PGB_SHOPIFY_SHOP",
    "PGB_SHOPIFY_API_VERSION",
    "PGB_HTTP_TIMEOUT",
    "PGB_GATEWAY_BUTTON_URL",
    "PGB_GATEWAY_TOKEN_PARAM",
    "PGB_GATEWAY_KEY_ID",
    "PGB_GATEWAY_NAME",
    "PGB_SIGNATURE_TOLERANCE",
    "PGB_WEBHOOK_SIGNATURE_HEADER",
    "PGB_WEBHOOK_KEY_ID_HEADER",
    "PGB_GATEWAY_IP_WHITELIST",
    "PGB_USE_X_FORWARDED_FOR",
    "PGB_USE_FORWARDED",
    "PGB_CONFIRM_FALLBACK_URL",
];

/// The server takes no arguments. If any are given, print the help text and the current environment, and return
/// `true` so that the caller can exit.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        println!("\n{README}\n");
        println!("Current environment values (EXCLUDING variables that contain secrets):");
        DISPLAY_ENVS.iter().for_each(|&name| println!("  {name:<35} {:<15}", env_value(name)));
    }
    has_cli_args
}

fn env_value(name: &str) -> String {
    match env::var(name) {
        Ok(s) => s,
        Err(VarError::NotPresent) => "Not set".into(),
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}
