use crate::api::{Api, MovementQuery, UserHoldingsQuery};
use crate::listing::LastPageJump;
use crate::model::{Movement, MovementType};
use crate::operations::OperationKind;
use crate::selection::{SelectOption, Selection};
use crate::utils::{abbreviate, local_time, usd_or_dash};
use crate::views::actions::{
    ConversionModal, DepositModal, OpenRequest, OperationTarget, TransferModal, WithdrawModal,
};
use crate::views::multi_select::MultiSelect;
use crate::views::widgets::Pager;
use dioxus::prelude::*;

/// Full text of a truncated ledger cell
#[derive(Debug, Clone, PartialEq)]
enum Viewer {
    TxHash(String),
    Notes(String),
}

impl Viewer {
    fn title(&self) -> &'static str {
        match self {
            Viewer::TxHash(_) => "Full Tx Hash",
            Viewer::Notes(_) => "Full notes",
        }
    }

    fn text(&self) -> &str {
        match self {
            Viewer::TxHash(text) | Viewer::Notes(text) => text,
        }
    }
}

/// Movements ledger of one user, with account and movement type filters and
/// the operation menu
#[component]
pub fn AccountTab(user_id: String, user_email: String) -> Element {
    let api = use_context::<Api>();
    let mut refresh = use_signal(|| 0u32);
    let mut page = use_signal(|| 1u32);
    let mut total_pages = use_signal(|| 1u32);
    let mut jump = use_signal(LastPageJump::default);
    let mut accounts = use_signal(Selection::default);
    let mut kinds = use_signal(Selection::default);
    let mut menu_open = use_signal(|| false);
    let mut request = use_signal(|| None::<OpenRequest>);
    let mut viewer = use_signal(|| None::<Viewer>);

    let holdings_api = api.clone();
    let holdings_user = user_id.clone();
    let holdings = use_resource(move || {
        let api = holdings_api.clone();
        let query = UserHoldingsQuery::all(&holdings_user);
        let _ = refresh();
        async move {
            api.user_holdings(&query).await.unwrap_or_else(|e| {
                log::warn!("Failed to load account holdings: {}", e);
                Vec::new()
            })
        }
    });

    let types_api = api.clone();
    let movement_types = use_resource(move || {
        let api = types_api.clone();
        async move {
            api.movement_types().await.unwrap_or_else(|e| {
                log::warn!("Failed to load movement types: {}", e);
                Vec::new()
            })
        }
    });

    let account_options = use_memo(move || {
        holdings
            .read()
            .as_ref()
            .map(|lines| {
                lines
                    .iter()
                    .map(|line| {
                        let label = if line.holding_id.name.is_empty() {
                            line.account_holding_id.clone()
                        } else {
                            line.holding_id.name.clone()
                        };
                        SelectOption::new(line.account_holding_id.clone(), label)
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    });

    let type_catalog = use_memo(move || movement_types.read().clone().unwrap_or_default());
    let type_options = use_memo(move || {
        type_catalog
            .read()
            .iter()
            .map(|t| SelectOption::new(t.id.to_string(), t.name.clone()))
            .collect::<Vec<_>>()
    });

    use_effect(move || sync_selection(accounts, &account_options.read()));
    use_effect(move || sync_selection(kinds, &type_options.read()));

    let movements_user = user_id.clone();
    let query = use_memo(move || MovementQuery {
        user_id: movements_user.clone(),
        page: page(),
        account_holding_ids: accounts.read().selected().to_vec(),
        movement_type_ids: kinds.read().selected().to_vec(),
    });

    let movements = use_resource(move || {
        let api = api.clone();
        let query = query();
        let _ = refresh();
        async move { api.movements(&query).await }
    });

    use_effect(move || {
        if let Some(Ok(result)) = &*movements.read() {
            total_pages.set(result.total_pages.max(1));
            let current = *page.peek();
            let target = jump.write().on_load(current, result.total_pages);
            if let Some(last) = target {
                log::debug!("Jumping to most recent movements on page {}", last);
                page.set(last);
            }
        }
    });

    let on_completed = move |kind: OperationKind| {
        log::info!("{:?} completed, reloading movements", kind);
        refresh += 1;
    };

    let on_filter_change = move |_: ()| page.set(1);

    let open_operation = move |movement_type: MovementType| {
        menu_open.set(false);
        match OperationKind::from_code(&movement_type.code) {
            Some(kind) => {
                let nonce = (*request.peek()).map(|r| r.nonce + 1).unwrap_or(1);
                request.set(Some(OpenRequest { kind, nonce }));
            }
            None => log::warn!(
                "No operation form for movement type {:?}",
                movement_type.code
            ),
        }
    };
    let open_operation = EventHandler::new(open_operation);
    let on_view = EventHandler::new(move |shown: Viewer| viewer.set(Some(shown)));

    let target = OperationTarget {
        user_id: user_id.clone(),
        user_email: user_email.clone(),
        movement_types: type_catalog(),
    };

    rsx! {
        div { class: "account-tab",
            div { class: "ledger-toolbar",
                MultiSelect {
                    label: "Accounts",
                    all_label: "All",
                    options: account_options(),
                    selection: accounts,
                    on_change: on_filter_change,
                }
                MultiSelect {
                    label: "Movement type",
                    all_label: "All",
                    options: type_options(),
                    selection: kinds,
                    on_change: on_filter_change,
                }
                div { class: "operate-menu",
                    button {
                        r#type: "button",
                        class: "button-primary",
                        onclick: move |_| menu_open.toggle(),
                        "Operate"
                    }
                    if menu_open() {
                        div {
                            class: "menu-backdrop",
                            onclick: move |_| menu_open.set(false),
                        }
                        ul { class: "menu",
                            for movement_type in type_catalog.read().iter() {
                                MenuEntry {
                                    key: "{movement_type.id}",
                                    movement_type: movement_type.clone(),
                                    on_pick: open_operation,
                                }
                            }
                        }
                    }
                }
            }

            match &*movements.read() {
                None => rsx! {
                    p { class: "loading", "Loading movements..." }
                },
                Some(Err(e)) => rsx! {
                    p { class: "error-message", "Error loading movements: {e}" }
                },
                Some(Ok(result)) => rsx! {
                    table { class: "data-table ledger",
                        thead {
                            tr {
                                th { "Date" }
                                th { "Asset" }
                                th { "Movement Type" }
                                th { "USD value" }
                                th { "Credit" }
                                th { "Debit" }
                                th { "Balance" }
                                th { "Tx hash" }
                                th { "Notes" }
                            }
                        }
                        tbody {
                            for (key, movement) in keyed(&result.data) {
                                MovementRow {
                                    key: "{key}",
                                    movement: movement.clone(),
                                    on_view,
                                }
                            }
                            if result.data.is_empty() {
                                tr {
                                    td { class: "empty", colspan: 9, "No movements found." }
                                }
                            }
                        }
                    }
                },
            }

            Pager {
                current: page(),
                total: total_pages(),
                on_change: move |next: u32| page.set(next.clamp(1, total_pages())),
            }

            if let Some((title, text)) = viewer().map(|shown| (shown.title(), shown.text().to_string())) {
                div { class: "modal-overlay", onclick: move |_| viewer.set(None),
                    div {
                        class: "modal",
                        role: "dialog",
                        onclick: move |evt: MouseEvent| evt.stop_propagation(),
                        h3 { "{title}" }
                        pre { class: "full-text", "{text}" }
                        div { class: "modal-actions",
                            button {
                                r#type: "button",
                                class: "button-secondary",
                                onclick: move |_| viewer.set(None),
                                "Close"
                            }
                        }
                    }
                }
            }

            DepositModal { request, target: target.clone(), on_completed }
            WithdrawModal { request, target: target.clone(), on_completed }
            TransferModal { request, target, on_completed }
            ConversionModal { request }
        }
    }
}

fn keyed(movements: &[Movement]) -> impl Iterator<Item = (String, &Movement)> {
    movements
        .iter()
        .enumerate()
        .map(|(index, movement)| (movement.row_key(index), movement))
}

/// Selects every option the first time a non-empty list shows up
fn sync_selection(mut selection: Signal<Selection>, options: &[SelectOption]) {
    let mut next = selection.peek().clone();
    next.sync_options(options);
    if next != *selection.peek() {
        selection.set(next);
    }
}

#[component]
fn MenuEntry(movement_type: MovementType, on_pick: EventHandler<MovementType>) -> Element {
    let picked = movement_type.clone();

    rsx! {
        li {
            button {
                r#type: "button",
                class: "menu-item",
                onclick: move |_| on_pick.call(picked.clone()),
                "{movement_type.name}"
            }
        }
    }
}

#[component]
fn MovementRow(movement: Movement, on_view: EventHandler<Viewer>) -> Element {
    let date = local_time(&movement.timestamp);
    let asset = movement.asset_name().unwrap_or("-").to_string();
    let kind = movement.type_name().unwrap_or("-").to_string();
    let value = usd_or_dash(movement.value_usd);
    let credit = usd_or_dash(movement.credit());
    let debit = usd_or_dash(movement.debit());
    let balance = usd_or_dash(movement.units_after);
    let explorer = movement.explorer_url().unwrap_or_default();
    let hash = movement.tx_hash().map(|full| (full.to_string(), abbreviate(full)));
    let notes = movement.notes().map(|full| (full.to_string(), abbreviate(full)));

    let full_hash = movement.tx_hash().unwrap_or_default().to_string();
    let show_hash = move |evt: MouseEvent| {
        evt.prevent_default();
        on_view.call(Viewer::TxHash(full_hash.clone()));
    };
    let full_notes = movement.notes().unwrap_or_default().to_string();
    let show_notes = move |_: MouseEvent| on_view.call(Viewer::Notes(full_notes.clone()));

    rsx! {
        tr {
            td { "{date}" }
            td { "{asset}" }
            td { "{kind}" }
            td { "{value}" }
            td { class: "credit", "{credit}" }
            td { class: "debit", "{debit}" }
            td { "{balance}" }
            td {
                if let Some((full, short)) = hash {
                    a { href: "{explorer}", title: "{full}", onclick: show_hash, "{short}" }
                } else {
                    "-"
                }
            }
            td {
                if let Some((full, short)) = notes {
                    button {
                        r#type: "button",
                        class: "link-button",
                        title: "{full}",
                        onclick: show_notes,
                        "{short}"
                    }
                } else {
                    "-"
                }
            }
        }
    }
}
