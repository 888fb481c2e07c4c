use crate::listing::page_window;
use dioxus::prelude::*;

fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

#[component]
pub fn Avatar(name: String, #[props(!optional)] url: Option<String>) -> Element {
    let letters = initials(&name);

    rsx! {
        if let Some(url) = url {
            img { class: "avatar", src: "{url}", alt: "{name}" }
        } else {
            div { class: "avatar avatar-text", "{letters}" }
        }
    }
}

#[component]
pub fn ProgressBar(percent: u8) -> Element {
    rsx! {
        div { class: "progress",
            div { class: "progress-fill", style: "width: {percent}%" }
            span { class: "progress-label", "{percent}%" }
        }
    }
}

/// Previous / numbered / next buttons, with gaps for long page ranges
#[component]
pub fn Pager(current: u32, total: u32, on_change: EventHandler<u32>) -> Element {
    let pages = page_window(current, total);

    rsx! {
        nav { class: "pager",
            button {
                disabled: current <= 1,
                onclick: move |_| on_change.call(current.saturating_sub(1).max(1)),
                "Previous"
            }
            for (index, page) in pages.into_iter().enumerate() {
                match page {
                    Some(page) => rsx! {
                        button {
                            key: "{index}",
                            class: if page == current { "page active" } else { "page" },
                            onclick: move |_| on_change.call(page),
                            "{page}"
                        }
                    },
                    None => rsx! {
                        span { key: "{index}", class: "page-gap", "..." }
                    },
                }
            }
            button {
                disabled: current >= total,
                onclick: move |_| on_change.call(current + 1),
                "Next"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::initials;

    #[test]
    fn test_initials() {
        assert_eq!(initials("ana maria lopez"), "AM");
        assert_eq!(initials("bo"), "B");
        assert_eq!(initials(""), "");
    }
}
