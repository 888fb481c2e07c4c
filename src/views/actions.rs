use std::future::Future;
use std::time::Duration;

use crate::api::Api;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::ApiError;
use crate::model::{MovementType, UserSummary};
use crate::operations::conversion::ConversionForm;
use crate::operations::deposit::{self, DepositForm};
use crate::operations::transfer::{self, TransferForm};
use crate::operations::withdraw::{self, WithdrawForm};
use crate::operations::{
    AssetChoice, ModalStore, OperationForm, OperationKind, OperationModal, Phase, RateField,
    RecipientSearch, SubmitContext, Ticket, available_balance, price_quote, settle_submit,
};
use dioxus::prelude::*;

/// Asks the modal of `kind` to open. A new nonce reopens a modal of the
/// same kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenRequest {
    pub kind: OperationKind,
    pub nonce: u64,
}

/// The user the operations act on
#[derive(Debug, Clone, PartialEq)]
pub struct OperationTarget {
    pub user_id: String,
    pub user_email: String,
    pub movement_types: Vec<MovementType>,
}

impl OperationTarget {
    fn context(&self) -> SubmitContext {
        SubmitContext {
            user_id: self.user_id.clone(),
            user_email: self.user_email.clone(),
            movement_types: self.movement_types.clone(),
        }
    }
}

impl<F: OperationForm> ModalStore for Signal<OperationModal<F>> {
    type Form = F;

    fn update<R>(&mut self, change: impl FnOnce(&mut OperationModal<F>) -> R) -> R {
        change(&mut self.write())
    }
}

fn use_open_request(
    kind: OperationKind,
    request: ReadOnlySignal<Option<OpenRequest>>,
    mut on_open: impl FnMut() + 'static,
) {
    let mut seen = use_signal(|| None::<u64>);
    use_effect(move || {
        let Some(request) = request() else {
            return;
        };
        if request.kind != kind || *seen.peek() == Some(request.nonce) {
            return;
        }
        seen.set(Some(request.nonce));
        log::debug!("Opening {:?} modal", kind);
        on_open();
    });
}

/// Modal state of form `F`, opened on request with its asset list loaded by
/// `load`
fn use_operation_modal<F, Fut>(
    request: ReadOnlySignal<Option<OpenRequest>>,
    api: Api,
    user_id: String,
    load: impl Fn(Api, String) -> Fut + 'static,
) -> Signal<OperationModal<F>>
where
    F: OperationForm,
    Fut: Future<Output = Result<Vec<AssetChoice>, ApiError>> + 'static,
{
    let mut modal = use_signal(OperationModal::<F>::default);
    use_open_request(F::KIND, request, move || {
        let ticket = modal.write().open();
        let assets = load(api.clone(), user_id.clone());
        spawn(async move {
            let result = assets.await;
            modal.write().assets_loaded(ticket, result);
        });
    });
    modal
}

/// Price lookup and, for forms that track it, balance lookup of the newly
/// picked asset. A failed lookup leaves the value unknown.
fn spawn_lookups<F: OperationForm>(
    api: Api,
    mut modal: Signal<OperationModal<F>>,
    ticket: Ticket,
    holding_id: i64,
    user_id: String,
) {
    let price_api = api.clone();
    spawn(async move {
        let quote = price_quote(&*price_api, holding_id)
            .await
            .unwrap_or_else(|e| {
                log::warn!("Price lookup for holding {} failed: {}", holding_id, e);
                None
            });
        modal.write().apply_price(ticket, quote);
    });

    if F::TRACKS_BALANCE {
        spawn(async move {
            let available = available_balance(&*api, &user_id, holding_id)
                .await
                .unwrap_or_else(|e| {
                    log::warn!("Balance lookup for holding {} failed: {}", holding_id, e);
                    None
                });
            modal.write().apply_balance(ticket, available);
        });
    }
}

/// Validates and sends. The answer is settled in the background.
fn submit_with<F, Fut>(
    mut modal: Signal<OperationModal<F>>,
    ctx: &SubmitContext,
    close_delay: Duration,
    on_completed: EventHandler<OperationKind>,
    send: impl FnOnce(F::Payload) -> Fut,
) where
    F: OperationForm,
    Fut: Future<Output = Result<(), ApiError>> + 'static,
{
    let begun = modal.write().begin_submit(ctx);
    let payload = match begun {
        Ok(payload) => payload,
        Err(e) => {
            log::debug!("{:?} not submitted: {}", F::KIND, e);
            return;
        }
    };
    let session = modal.peek().session();
    let sent = send(payload);

    spawn(async move {
        settle_submit(modal, session, sent, close_delay, |kind| on_completed.call(kind)).await;
    });
}

fn success_text(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Deposit => "Deposit registered successfully.",
        OperationKind::Withdraw => "Withdrawal registered successfully.",
        OperationKind::Transfer => "Transfer completed successfully.",
        OperationKind::Conversion => "Conversion registered successfully.",
    }
}

/// The modal body shared by deposit, withdraw and transfer: asset, amount,
/// rate, optional tx hash and notes. `leading` renders above the asset.
fn operation_form<F, Fut>(
    mut modal: Signal<OperationModal<F>>,
    api: Api,
    close_delay: Duration,
    target: &OperationTarget,
    on_completed: EventHandler<OperationKind>,
    leading: Element,
    send: impl Fn(Api, F::Payload) -> Fut + 'static,
) -> Element
where
    F: OperationForm,
    Fut: Future<Output = Result<(), ApiError>> + 'static,
{
    let state = modal.read().clone();
    let submitting = state.phase() == &Phase::Submitting;
    let succeeded = state.phase() == &Phase::Succeeded;

    let lookup_api = api.clone();
    let user_id = target.user_id.clone();
    let on_select = move |value: String| {
        let picked = modal.write().select_asset(&value);
        if let Some((ticket, holding_id)) = picked {
            spawn_lookups(lookup_api.clone(), modal, ticket, holding_id, user_id.clone());
        }
    };

    let ctx = target.context();
    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let api = api.clone();
        submit_with(modal, &ctx, close_delay, on_completed, |payload| send(api, payload));
    };

    rsx! {
        ModalFrame {
            title: F::KIND.title().to_string(),
            busy: submitting,
            on_close: move |_| modal.write().close(),
            form { onsubmit: on_submit,
                {leading}
                AssetSelect {
                    choices: state.assets().to_vec(),
                    selected: state.draft.asset.clone(),
                    loading: state.phase() == &Phase::LoadingAssets,
                    locked: submitting || succeeded,
                    on_select,
                }
                AmountField {
                    value: state.draft.amount.clone(),
                    available: if F::TRACKS_BALANCE { state.draft.available } else { None },
                    on_edit: move |text: String| {
                        modal.write().draft.edit_amount(&text);
                    },
                }
                RateInput {
                    rate: state.draft.rate.clone(),
                    loading: state.phase() == &Phase::LoadingDeps,
                    on_edit: move |text: String| {
                        modal.write().draft.rate.edit(&text);
                    },
                    on_invert: move |_| {
                        modal.write().draft.rate.invert();
                    },
                }
                if F::TAKES_TX_HASH {
                    TextField {
                        label: "Tx hash",
                        value: state.draft.tx_hash.clone(),
                        on_edit: move |text: String| modal.write().draft.tx_hash = text,
                    }
                }
                TextField {
                    label: "Notes",
                    value: state.draft.notes.clone(),
                    on_edit: move |text: String| modal.write().draft.notes = text,
                }
                StatusLine {
                    error: state.error().map(str::to_string),
                    success: succeeded.then(|| success_text(F::KIND).to_string()),
                    on_dismiss: move |_| modal.write().dismiss_error(),
                }
                FormButtons {
                    submitting,
                    disabled: state.is_busy() || succeeded,
                    on_cancel: move |_| modal.write().close(),
                }
            }
        }
    }
}

#[component]
pub fn DepositModal(
    request: ReadOnlySignal<Option<OpenRequest>>,
    target: OperationTarget,
    on_completed: EventHandler<OperationKind>,
) -> Element {
    let api = use_context::<Api>();
    let config = use_context::<Config>();
    let modal: Signal<OperationModal<DepositForm>> = use_operation_modal(
        request,
        api.clone(),
        target.user_id.clone(),
        |api, _| async move { deposit::load_assets(&*api).await },
    );

    if !modal.read().is_open() {
        return rsx! {};
    }
    operation_form(
        modal,
        api,
        config.close_delay,
        &target,
        on_completed,
        rsx! {},
        |api, payload| async move { deposit::submit(&*api, &payload).await },
    )
}

#[component]
pub fn WithdrawModal(
    request: ReadOnlySignal<Option<OpenRequest>>,
    target: OperationTarget,
    on_completed: EventHandler<OperationKind>,
) -> Element {
    let api = use_context::<Api>();
    let config = use_context::<Config>();
    let modal: Signal<OperationModal<WithdrawForm>> = use_operation_modal(
        request,
        api.clone(),
        target.user_id.clone(),
        |api, user_id| async move { withdraw::load_assets(&*api, &user_id).await },
    );

    if !modal.read().is_open() {
        return rsx! {};
    }
    operation_form(
        modal,
        api,
        config.close_delay,
        &target,
        on_completed,
        rsx! {},
        |api, payload| async move { withdraw::submit(&*api, &payload).await },
    )
}

#[component]
pub fn TransferModal(
    request: ReadOnlySignal<Option<OpenRequest>>,
    target: OperationTarget,
    on_completed: EventHandler<OperationKind>,
) -> Element {
    let api = use_context::<Api>();
    let config = use_context::<Config>();
    let mut modal: Signal<OperationModal<TransferForm>> = use_operation_modal(
        request,
        api.clone(),
        target.user_id.clone(),
        |api, user_id| async move { transfer::load_assets(&*api, &user_id).await },
    );
    let debouncer = use_hook(|| Debouncer::new(config.search_debounce));

    let on_unmount = debouncer.clone();
    use_drop(move || on_unmount.cancel());

    if !modal.read().is_open() {
        return rsx! {};
    }

    let search_api = api.clone();
    let on_recipient_edit = move |text: String| {
        modal.write().form.recipient.edit(&text);
        let debouncer = debouncer.clone();
        let api = search_api.clone();
        spawn(async move {
            let Some(query) = debouncer.call(text).await else {
                return;
            };
            let go = modal.write().form.recipient.begin_lookup(&query);
            if !go {
                return;
            }
            let found = transfer::find_recipients(&*api, &query).await;
            modal.write().form.recipient.finish_lookup(&query, found);
        });
    };

    let recipient = rsx! {
        RecipientField {
            search: modal.read().form.recipient.clone(),
            on_edit: on_recipient_edit,
            on_choose: move |user: UserSummary| modal.write().form.recipient.choose(&user),
            on_focus: move |_| modal.write().form.recipient.focus(),
            on_blur: move |_| modal.write().form.recipient.blur(),
        }
    };

    operation_form(
        modal,
        api,
        config.close_delay,
        &target,
        on_completed,
        recipient,
        |api, payload| async move { transfer::submit(&*api, &payload).await },
    )
}

/// Form only: nothing is listed and Confirm stays disabled
#[component]
pub fn ConversionModal(request: ReadOnlySignal<Option<OpenRequest>>) -> Element {
    let mut draft = use_signal(ConversionForm::default);

    use_open_request(OperationKind::Conversion, request, move || {
        draft.write().open();
    });

    if !draft.read().is_open() {
        return rsx! {};
    }
    let state = draft.read().clone();

    rsx! {
        ModalFrame {
            title: OperationKind::Conversion.title().to_string(),
            busy: false,
            on_close: move |_| draft.write().close(),
            form { onsubmit: move |evt: FormEvent| evt.prevent_default(),
                label { class: "field",
                    "From asset"
                    select {
                        value: "{state.from_asset}",
                        onchange: move |evt: FormEvent| draft.write().from_asset = evt.value(),
                        option { value: "", "Select asset" }
                    }
                }
                label { class: "field",
                    "To asset"
                    select {
                        value: "{state.to_asset}",
                        onchange: move |evt: FormEvent| draft.write().to_asset = evt.value(),
                        option { value: "", "Select asset" }
                    }
                }
                AmountField {
                    value: state.amount.clone(),
                    available: None,
                    on_edit: move |text: String| {
                        draft.write().edit_amount(&text);
                    },
                }
                RateInput {
                    rate: state.rate.clone(),
                    loading: false,
                    on_edit: move |text: String| {
                        draft.write().rate.edit(&text);
                    },
                    on_invert: move |_| {
                        draft.write().rate.invert();
                    },
                }
                TextField {
                    label: "Tx hash",
                    value: state.tx_hash.clone(),
                    on_edit: move |text: String| draft.write().tx_hash = text,
                }
                TextField {
                    label: "Notes",
                    value: state.notes.clone(),
                    on_edit: move |text: String| draft.write().notes = text,
                }
                FormButtons {
                    submitting: false,
                    disabled: !state.can_submit(),
                    on_cancel: move |_| draft.write().close(),
                }
            }
        }
    }
}

#[component]
fn ModalFrame(title: String, busy: bool, on_close: EventHandler<()>, children: Element) -> Element {
    rsx! {
        div {
            class: "modal-overlay",
            onclick: move |_| {
                if !busy {
                    on_close.call(());
                }
            },
            onkeydown: move |evt: KeyboardEvent| {
                if evt.key() == Key::Escape && !busy {
                    on_close.call(());
                }
            },
            div {
                class: "modal",
                role: "dialog",
                onclick: move |evt: MouseEvent| evt.stop_propagation(),
                div { class: "modal-header",
                    h3 { "{title}" }
                    button {
                        r#type: "button",
                        class: "modal-close",
                        disabled: busy,
                        onclick: move |_| on_close.call(()),
                        "×"
                    }
                }
                {children}
            }
        }
    }
}

#[component]
fn AssetSelect(
    choices: Vec<AssetChoice>,
    #[props(!optional)] selected: Option<String>,
    loading: bool,
    locked: bool,
    on_select: EventHandler<String>,
) -> Element {
    let current = selected.unwrap_or_default();

    rsx! {
        label { class: "field",
            "Asset"
            select {
                value: "{current}",
                disabled: loading || locked,
                onchange: move |evt: FormEvent| on_select.call(evt.value()),
                option { value: "", if loading { "Loading assets..." } else { "Select asset" } }
                for choice in choices.iter() {
                    option {
                        key: "{choice.value}",
                        value: "{choice.value}",
                        selected: choice.value == current,
                        "{choice.label}"
                    }
                }
            }
        }
    }
}

#[component]
fn AmountField(
    value: String,
    #[props(!optional)] available: Option<f64>,
    on_edit: EventHandler<String>,
) -> Element {
    rsx! {
        label { class: "field",
            "Amount"
            input {
                r#type: "text",
                inputmode: "decimal",
                placeholder: "0.00",
                value: "{value}",
                oninput: move |evt: FormEvent| on_edit.call(evt.value()),
            }
            if let Some(available) = available {
                span { class: "field-hint", "Available: {available}" }
            }
        }
    }
}

#[component]
fn RateInput(
    rate: RateField,
    loading: bool,
    on_edit: EventHandler<String>,
    on_invert: EventHandler<()>,
) -> Element {
    let locked = rate.is_locked();
    let value = rate.value().to_string();

    rsx! {
        label { class: "field",
            "FX USD"
            div { class: "rate-input",
                input {
                    r#type: "text",
                    inputmode: "decimal",
                    value: "{value}",
                    disabled: locked || loading,
                    placeholder: if loading { "Loading..." } else { "" },
                    oninput: move |evt: FormEvent| on_edit.call(evt.value()),
                }
                button {
                    r#type: "button",
                    class: "rate-invert",
                    title: "Invert rate",
                    disabled: locked || loading,
                    onclick: move |_| on_invert.call(()),
                    "⇄"
                }
            }
        }
    }
}

#[component]
fn TextField(label: String, value: String, on_edit: EventHandler<String>) -> Element {
    rsx! {
        label { class: "field",
            "{label}"
            input {
                r#type: "text",
                value: "{value}",
                oninput: move |evt: FormEvent| on_edit.call(evt.value()),
            }
        }
    }
}

#[component]
fn RecipientField(
    search: RecipientSearch,
    on_edit: EventHandler<String>,
    on_choose: EventHandler<UserSummary>,
    on_focus: EventHandler<()>,
    on_blur: EventHandler<()>,
) -> Element {
    let text = search.text().to_string();
    let candidates = search.candidates().to_vec();
    let open = search.is_open();
    let loading = search.is_loading();

    rsx! {
        label { class: "field recipient",
            "Recipient email"
            input {
                r#type: "email",
                autocomplete: "off",
                value: "{text}",
                oninput: move |evt: FormEvent| on_edit.call(evt.value()),
                onfocus: move |_| on_focus.call(()),
                onblur: move |_| on_blur.call(()),
            }
            if open {
                ul { class: "typeahead",
                    if loading {
                        li { class: "typeahead-note", "Searching..." }
                    } else if candidates.is_empty() {
                        li { class: "typeahead-note", "No users found" }
                    }
                    for (index, user) in candidates.into_iter().enumerate() {
                        CandidateRow { key: "{index}", user, on_choose }
                    }
                }
            }
        }
    }
}

#[component]
fn CandidateRow(user: UserSummary, on_choose: EventHandler<UserSummary>) -> Element {
    let picked = user.clone();

    rsx! {
        li {
            class: "typeahead-option",
            // mousedown lands before the input's blur closes the list
            onmousedown: move |evt: MouseEvent| {
                evt.prevent_default();
                on_choose.call(picked.clone());
            },
            span { "{user.email}" }
            if !user.name.is_empty() {
                span { class: "typeahead-name", " {user.name}" }
            }
        }
    }
}

#[component]
fn StatusLine(
    #[props(!optional)] error: Option<String>,
    #[props(!optional)] success: Option<String>,
    on_dismiss: EventHandler<()>,
) -> Element {
    rsx! {
        if let Some(reason) = error {
            div { class: "form-error",
                span { "{reason}" }
                button {
                    r#type: "button",
                    class: "dismiss",
                    onclick: move |_| on_dismiss.call(()),
                    "×"
                }
            }
        }
        if let Some(message) = success {
            div { class: "form-success", "{message}" }
        }
    }
}

#[component]
fn FormButtons(submitting: bool, disabled: bool, on_cancel: EventHandler<()>) -> Element {
    rsx! {
        div { class: "modal-actions",
            button {
                r#type: "button",
                class: "button-secondary",
                disabled: submitting,
                onclick: move |_| on_cancel.call(()),
                "Cancel"
            }
            button { r#type: "submit", class: "button-primary", disabled,
                if submitting { "Processing..." } else { "Confirm" }
            }
        }
    }
}
