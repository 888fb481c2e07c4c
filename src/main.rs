mod api;
mod config;
mod debounce;
mod error;
mod listing;
mod model;
mod operations;
mod selection;
mod state;
mod storage;
mod utils;
mod views;

use std::rc::Rc;

use dioxus::prelude::*;

use crate::api::{Api, ApiClient};
use crate::config::Config;
use crate::state::UserContext;
use crate::views::{
    AllUsers, ForgotPassword, Home, Navbar, Protected, ResetPassword, SignIn, ViewUser,
};

const MAIN_CSS: Asset = asset!("/assets/main.css");

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Protected)]
        #[layout(Navbar)]
            #[route("/")]
            Home {},
            #[route("/admin/users")]
            AllUsers {},
            #[route("/admin/users/view?:id")]
            ViewUser { id: String },
        #[end_layout]
    #[end_layout]
    #[route("/signin?:token")]
    SignIn { token: String },
    #[route("/forgot-password")]
    ForgotPassword {},
    #[route("/reset-password?:token")]
    ResetPassword { token: String },
}

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Origin of the admin API
    #[arg(long, default_value_t = String::from(config::DEFAULT_API_URL))]
    api_url: String,
    /// Quiet period before search-as-you-type requests, in milliseconds
    #[arg(long, default_value_t = config::DEFAULT_DEBOUNCE_MS)]
    debounce_ms: u64,
    /// How long operation modals show their success message, in milliseconds
    #[arg(long, default_value_t = config::DEFAULT_CLOSE_DELAY_MS)]
    close_delay_ms: u64,
}

impl Args {
    fn into_config(self) -> Config {
        Config::new(&self.api_url, self.debounce_ms, self.close_delay_ms)
    }
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        use clap::Parser;

        env_logger::init();
        let config = Args::parse().into_config();
        log::info!(
            "Starting fund admin dashboard against {}",
            config.api_base
        );
        config::install(config);
    }

    #[cfg(target_arch = "wasm32")]
    config::install(Config::default());

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let config = use_hook(config::current);
    let storage = use_hook(storage::platform_storage);
    let api = use_hook(|| Api::new(Rc::new(ApiClient::new(config.clone(), storage.clone()))));

    use_context_provider(|| config.clone());
    use_context_provider(|| api.clone());
    let session = use_context_provider(|| UserContext::new(api.clone(), storage.clone()));

    use_effect(move || session.refresh());

    rsx! {
        document::Meta {
            name: "viewport",
            content: "width=device-width, initial-scale=1.0",
        }
        document::Stylesheet { href: MAIN_CSS }
        Router::<Route> {}
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::time::Duration;

    #[test]
    fn test_args_parsing() {
        use super::Args;
        let args = Args::parse_from(vec![
            "fund-admin",
            "--api-url",
            "https://api.example.com/",
            "--debounce-ms",
            "250",
        ]);
        assert_eq!(args.api_url, "https://api.example.com/");
        assert_eq!(args.debounce_ms, 250);
        assert_eq!(args.close_delay_ms, 1200);

        let config = args.into_config();
        assert_eq!(config.api_base, "https://api.example.com");
        assert_eq!(config.search_debounce, Duration::from_millis(250));
    }

    #[test]
    fn test_args_parsing_defaults() {
        use super::Args;
        let args = Args::parse_from(vec!["fund-admin"]);
        assert_eq!(args.api_url, "http://localhost:3000");
        assert_eq!(args.debounce_ms, 400);
        assert_eq!(args.close_delay_ms, 1200);
    }
}
