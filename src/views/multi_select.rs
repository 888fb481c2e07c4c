use crate::selection::{SelectOption, Selection};
use dioxus::prelude::*;

/// Checkbox dropdown over `options`. `on_change` fires on user toggles only,
/// not when the first option list selects everything.
#[component]
pub fn MultiSelect(
    label: String,
    all_label: String,
    options: Vec<SelectOption>,
    selection: Signal<Selection>,
    on_change: EventHandler<()>,
) -> Element {
    let (summary, open, all_selected, selected) = {
        let current = selection.read();
        (
            current.summary(&options, &all_label),
            current.is_open(),
            current.is_all_selected(&options),
            current.selected().to_vec(),
        )
    };

    let all_options = options.clone();
    let on_toggle_all = move |_: FormEvent| {
        selection.write().toggle_all(&all_options);
        on_change.call(());
    };
    let toggle_options = options.clone();
    let on_toggle = EventHandler::new(move |value: String| {
        selection.write().toggle(&value, &toggle_options);
        on_change.call(());
    });

    rsx! {
        div {
            class: "multi-select",
            onkeydown: move |evt: KeyboardEvent| selection.write().on_key(&evt.key().to_string()),
            span { class: "multi-select-label", "{label}" }
            button {
                r#type: "button",
                class: "multi-select-toggle",
                aria_expanded: "{open}",
                onclick: move |_| selection.write().toggle_open(),
                "{summary}"
            }
            if open {
                div {
                    class: "multi-select-backdrop",
                    onclick: move |_| selection.write().close(),
                }
                div { class: "multi-select-panel",
                    label { class: "multi-select-option",
                        input {
                            r#type: "checkbox",
                            checked: all_selected,
                            onchange: on_toggle_all,
                        }
                        "{all_label}"
                    }
                    for option in options.iter() {
                        OptionRow {
                            key: "{option.value}",
                            option: option.clone(),
                            checked: selected.contains(&option.value),
                            on_toggle,
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn OptionRow(option: SelectOption, checked: bool, on_toggle: EventHandler<String>) -> Element {
    let value = option.value.clone();

    rsx! {
        label { class: "multi-select-option",
            input {
                r#type: "checkbox",
                checked,
                onchange: move |_| on_toggle.call(value.clone()),
            }
            "{option.label}"
        }
    }
}
