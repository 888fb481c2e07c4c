use crate::Route;
use crate::api::{Api, UserListQuery};
use crate::config::Config;
use crate::debounce::use_debounced;
use crate::listing::{PAGE_SIZES, SortOrder, UserListState, UserSortKey};
use crate::model::User;
use crate::views::widgets::{Avatar, Pager, ProgressBar};
use dioxus::prelude::*;

/// Paginated, sortable and searchable table of all users
#[component]
pub fn AllUsers() -> Element {
    let api = use_context::<Api>();
    let config = use_context::<Config>();
    let mut list = use_signal(UserListState::default);
    let mut search_text = use_signal(String::new);
    let settled_search = use_debounced(search_text, config.search_debounce);

    use_effect(move || {
        let term = settled_search();
        if list.peek().search != term {
            list.write().set_search(&term);
        }
    });

    // Totals are written back into `list`; the memo keeps that from
    // triggering another fetch.
    let query = use_memo(move || {
        let state = list.read();
        UserListQuery {
            page: state.page,
            limit: state.per_page,
            sort_key: state.sort_key,
            sort_order: state.sort_order,
            search: state.search.clone(),
        }
    });

    let users = use_resource(move || {
        let api = api.clone();
        let query = query();
        async move {
            log::debug!("Fetching users page {}", query.page);
            api.list_users(&query).await
        }
    });

    use_effect(move || {
        if let Some(Ok(page)) = &*users.read() {
            list.write().set_totals(page.total_pages, page.total);
        }
    });

    let state = list.read().clone();
    let (first, last) = state.showing();

    rsx! {
        div { id: "users-page",
            h2 { "Users" }
            div { class: "table-toolbar",
                label { class: "page-size",
                    "Show "
                    select {
                        value: "{state.per_page}",
                        onchange: move |evt: FormEvent| {
                            if let Ok(per_page) = evt.value().parse::<u32>() {
                                list.write().set_per_page(per_page);
                            }
                        },
                        for size in PAGE_SIZES {
                            option {
                                key: "{size}",
                                value: "{size}",
                                selected: size == state.per_page,
                                "{size}"
                            }
                        }
                    }
                    " entries"
                }
                input {
                    r#type: "search",
                    class: "search",
                    placeholder: "Search...",
                    value: "{search_text}",
                    oninput: move |evt: FormEvent| {
                        search_text.set(evt.value());
                        if list.peek().page != 1 {
                            list.write().search_edited();
                        }
                    },
                }
            }

            match &*users.read() {
                None => rsx! {
                    p { class: "loading", "Loading users..." }
                },
                Some(Err(e)) => rsx! {
                    p { class: "error-message", "Error loading users: {e}" }
                },
                Some(Ok(page)) => rsx! {
                    table { class: "data-table",
                        thead {
                            tr {
                                SortHeader { label: "User", column: UserSortKey::Name, list }
                                SortHeader { label: "Onboarding", column: UserSortKey::Onboarding, list }
                                SortHeader { label: "Email", column: UserSortKey::Email, list }
                                SortHeader { label: "Verified", column: UserSortKey::Verified, list }
                                th { "Actions" }
                            }
                        }
                        tbody {
                            for user in page.data.iter() {
                                UserRow { key: "{user.id}", user: user.clone() }
                            }
                            if page.data.is_empty() {
                                tr {
                                    td { class: "empty", colspan: 5, "No users found." }
                                }
                            }
                        }
                    }
                },
            }

            div { class: "table-footer",
                if state.total_items > 0 {
                    p { "Showing {first} to {last} of {state.total_items} entries" }
                }
                Pager {
                    current: state.page,
                    total: state.total_pages,
                    on_change: move |page: u32| list.write().go_to(page),
                }
            }
        }
    }
}

#[component]
fn SortHeader(label: String, column: UserSortKey, list: Signal<UserListState>) -> Element {
    let (active, order) = {
        let state = list.read();
        (state.sort_key == column, state.sort_order)
    };
    let arrow = match (active, order) {
        (false, _) => "↕",
        (true, SortOrder::Asc) => "↑",
        (true, SortOrder::Desc) => "↓",
    };

    rsx! {
        th {
            class: if active { "sortable sorted" } else { "sortable" },
            onclick: move |_| list.write().sort_by(column),
            "{label} "
            span { class: "sort-icon", "{arrow}" }
        }
    }
}

#[component]
fn UserRow(user: User) -> Element {
    let navigator = use_navigator();
    let id = user.id.clone();
    let tone = user.approval_tone().css_class();
    let approval = user.approval_label().to_string();
    let progress = user.onboarding_progress();

    rsx! {
        tr {
            td {
                div { class: "user-cell",
                    Avatar { name: user.name.clone(), url: user.profile_image_url.clone() }
                    span { class: "user-name", "{user.name}" }
                }
            }
            td {
                ProgressBar { percent: progress }
            }
            td { "{user.email}" }
            td {
                span { class: "status {tone}", "{approval}" }
            }
            td {
                button {
                    class: "button-small",
                    onclick: move |_| {
                        navigator.push(Route::ViewUser { id: id.clone() });
                    },
                    "View account"
                }
            }
        }
    }
}
