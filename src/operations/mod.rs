//! Manual operation modals: deposit, withdraw, transfer and the conversion shell
//!
//! Each modal is an [`OperationModal`] driven through an explicit [`Phase`].
//! Opening the modal starts a new session; picking an asset starts a new
//! selection. Every asynchronous result comes back with the [`Ticket`] it was
//! issued under and is dropped if the modal has moved on since.

mod fields;

pub mod conversion;
pub mod deposit;
pub mod transfer;
pub mod withdraw;

pub use fields::{RateField, RecipientSearch, accepts_decimal_input, parse_amount};

use std::future::Future;
use std::time::Duration;

use crate::api::{AdminApi, HoldingsQuery, UserHoldingsQuery};
use crate::error::{ApiError, FormError};
use crate::model::{Holding, MovementType};
use crate::utils::sleep;

/// Operation picked from the "Operate" menu, keyed by movement type code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Deposit,
    Withdraw,
    Transfer,
    Conversion,
}

impl OperationKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "deposito" => Some(OperationKind::Deposit),
            "retiro" => Some(OperationKind::Withdraw),
            "transferencia" => Some(OperationKind::Transfer),
            "conversion" => Some(OperationKind::Conversion),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "Manual deposit",
            OperationKind::Withdraw => "Manual withdrawal",
            OperationKind::Transfer => "Transfer",
            OperationKind::Conversion => "Asset conversion",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "deposito",
            OperationKind::Withdraw => "retiro",
            OperationKind::Transfer => "transferencia",
            OperationKind::Conversion => "conversion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Closed,
    LoadingAssets,
    /// Assets listed, none picked yet
    Idle,
    LoadingDeps,
    Ready,
    Submitting,
    Succeeded,
    Failed(String),
}

/// Identifies the session and asset selection a request was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    session: u64,
    selection: u64,
}

/// One entry of the asset dropdown
#[derive(Debug, Clone, PartialEq)]
pub struct AssetChoice {
    /// What the dropdown reports back when this entry is picked
    pub value: String,
    pub label: String,
    /// Numeric holding id used for price and balance lookups and in payloads
    pub holding_id: i64,
}

/// Editable fields common to every operation form
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    pub asset: Option<String>,
    pub amount: String,
    pub rate: RateField,
    pub tx_hash: String,
    pub notes: String,
    /// Balance of the selected asset, `None` while unknown
    pub available: Option<f64>,
}

impl Draft {
    pub fn edit_amount(&mut self, text: &str) -> bool {
        if !accepts_decimal_input(text) {
            return false;
        }
        self.amount = text.to_string();
        true
    }
}

/// Who the operation is for, and the movement type catalog to resolve ids against
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitContext {
    pub user_id: String,
    pub user_email: String,
    pub movement_types: Vec<MovementType>,
}

/// What differs between the operation forms
pub trait OperationForm: Default + Clone + PartialEq + 'static {
    type Payload: Clone;

    const KIND: OperationKind;

    /// Whether picking an asset also looks up the user's balance of it
    const TRACKS_BALANCE: bool;

    /// Whether the form asks for an on-chain transaction hash
    const TAKES_TX_HASH: bool;

    /// Validates the draft and builds the request body
    fn build_payload(
        &self,
        draft: &Draft,
        asset: Option<&AssetChoice>,
        ctx: &SubmitContext,
    ) -> Result<Self::Payload, FormError>;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationModal<F: OperationForm> {
    phase: Phase,
    pub draft: Draft,
    pub form: F,
    assets: Vec<AssetChoice>,
    session: u64,
    selection: u64,
    pending_deps: u8,
}

impl<F: OperationForm> OperationModal<F> {
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != Phase::Closed
    }

    pub fn assets(&self) -> &[AssetChoice] {
        &self.assets
    }

    pub fn selected_asset(&self) -> Option<&AssetChoice> {
        let value = self.draft.asset.as_deref()?;
        self.assets.iter().find(|a| a.value == value)
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            Phase::LoadingAssets | Phase::LoadingDeps | Phase::Submitting
        )
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            session: self.session,
            selection: self.selection,
        }
    }

    fn reset_form(&mut self) {
        self.draft = Draft::default();
        self.form = F::default();
        self.pending_deps = 0;
    }

    /// Starts a new session with a blank form. The returned ticket goes with
    /// the asset list request.
    pub fn open(&mut self) -> Ticket {
        self.session += 1;
        self.selection = 0;
        self.reset_form();
        self.assets.clear();
        self.phase = Phase::LoadingAssets;
        log::debug!("Opening {:?} modal, session {}", F::KIND, self.session);
        self.ticket()
    }

    pub fn close(&mut self) {
        self.session += 1;
        self.reset_form();
        self.assets.clear();
        self.phase = Phase::Closed;
    }

    pub fn assets_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<AssetChoice>, ApiError>,
    ) -> bool {
        if ticket.session != self.session || self.phase != Phase::LoadingAssets {
            log::debug!("Discarding stale asset list for {:?}", F::KIND);
            return false;
        }
        match result {
            Ok(assets) => {
                self.assets = assets;
                self.phase = Phase::Idle;
            }
            Err(e) => {
                log::warn!("Failed to load assets for {:?}: {}", F::KIND, e);
                self.phase = Phase::Failed(e.to_string());
            }
        }
        true
    }

    /// Picks an asset. Returns the ticket and holding id the price (and
    /// balance) lookups must be issued with, or `None` when the selection was
    /// cleared. Ignored while a submit is in flight or has just succeeded.
    pub fn select_asset(&mut self, value: &str) -> Option<(Ticket, i64)> {
        if matches!(self.phase, Phase::Submitting | Phase::Succeeded) {
            log::debug!("Ignoring asset change while {:?} is submitting", F::KIND);
            return None;
        }
        self.selection += 1;
        self.draft.available = None;
        self.draft.rate.unlock();

        let holding_id = self
            .assets
            .iter()
            .find(|a| a.value == value)
            .map(|a| a.holding_id);

        match holding_id {
            Some(holding_id) => {
                self.draft.asset = Some(value.to_string());
                self.pending_deps = if F::TRACKS_BALANCE { 2 } else { 1 };
                self.phase = Phase::LoadingDeps;
                Some((self.ticket(), holding_id))
            }
            None => {
                if !value.is_empty() {
                    log::warn!("Unknown asset {:?} picked in {:?} modal", value, F::KIND);
                }
                self.draft.asset = None;
                self.pending_deps = 0;
                self.phase = Phase::Idle;
                None
            }
        }
    }

    fn accepts_deps(&self, ticket: Ticket) -> bool {
        if ticket != self.ticket() || self.phase != Phase::LoadingDeps {
            log::debug!(
                "Discarding stale lookup for {:?} (session {}, selection {})",
                F::KIND,
                ticket.session,
                ticket.selection
            );
            return false;
        }
        true
    }

    fn dep_done(&mut self) {
        self.pending_deps = self.pending_deps.saturating_sub(1);
        if self.pending_deps == 0 {
            self.phase = Phase::Ready;
        }
    }

    /// Applies the price lookup. `None` means the asset was not found.
    pub fn apply_price(&mut self, ticket: Ticket, holding: Option<Holding>) -> bool {
        if !self.accepts_deps(ticket) {
            return false;
        }
        self.draft.rate.apply_quote(holding.as_ref());
        self.dep_done();
        true
    }

    /// Applies the balance lookup. `None` keeps the balance unknown.
    pub fn apply_balance(&mut self, ticket: Ticket, available: Option<f64>) -> bool {
        if !self.accepts_deps(ticket) {
            return false;
        }
        self.draft.available = available;
        self.dep_done();
        true
    }

    /// Validates the form and moves to `Submitting`. A validation failure is
    /// shown in the modal and nothing is sent.
    pub fn begin_submit(&mut self, ctx: &SubmitContext) -> Result<F::Payload, FormError> {
        if !matches!(self.phase, Phase::Idle | Phase::Ready | Phase::Failed(_)) {
            return Err(FormError::Busy);
        }
        match self.form.build_payload(&self.draft, self.selected_asset(), ctx) {
            Ok(payload) => {
                self.phase = Phase::Submitting;
                Ok(payload)
            }
            Err(e) => {
                self.phase = Phase::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Records the submit outcome for `session`. Returns whether the server
    /// accepted the operation, even if the modal was closed meanwhile.
    pub fn finish_submit(&mut self, session: u64, result: Result<(), ApiError>) -> bool {
        let accepted = result.is_ok();
        if session != self.session {
            log::debug!("{:?} finished after its modal was closed", F::KIND);
            return accepted;
        }
        match result {
            Ok(()) => {
                log::info!("{:?} submitted", F::KIND);
                self.reset_form();
                self.phase = Phase::Succeeded;
            }
            Err(e) => {
                log::warn!("{:?} rejected: {}", F::KIND, e);
                self.phase = Phase::Failed(e.to_string());
            }
        }
        accepted
    }

    /// Closes after the success message, unless a newer session started
    pub fn auto_close(&mut self, session: u64) -> bool {
        if session != self.session || self.phase != Phase::Succeeded {
            return false;
        }
        self.close();
        true
    }

    pub fn dismiss_error(&mut self) {
        if let Phase::Failed(_) = self.phase {
            self.phase = if self.draft.asset.is_some() {
                Phase::Ready
            } else {
                Phase::Idle
            };
        }
    }
}

/// Wherever a modal's state lives between renders
pub trait ModalStore {
    type Form: OperationForm;

    fn update<R>(&mut self, change: impl FnOnce(&mut OperationModal<Self::Form>) -> R) -> R;
}

/// Waits for the answer to a submit begun under `session`. When the server
/// accepts, `on_accepted` runs at once and the modal closes itself after
/// `close_delay`. Returns whether the server accepted the operation.
pub async fn settle_submit<S: ModalStore>(
    mut store: S,
    session: u64,
    sent: impl Future<Output = Result<(), ApiError>>,
    close_delay: Duration,
    on_accepted: impl FnOnce(OperationKind),
) -> bool {
    let result = sent.await;
    let accepted = store.update(|modal| modal.finish_submit(session, result));
    if accepted {
        on_accepted(<S::Form as OperationForm>::KIND);
        sleep(close_delay).await;
        store.update(|modal| modal.auto_close(session));
    }
    accepted
}

fn movement_type(ctx: &SubmitContext, code: &'static str) -> Result<i64, FormError> {
    crate::model::movement_type_id(&ctx.movement_types, code)
        .ok_or(FormError::MissingMovementType(code))
}

/// Current price of one asset. An empty answer means unknown.
pub async fn price_quote(api: &dyn AdminApi, holding_id: i64) -> Result<Option<Holding>, ApiError> {
    let holdings = api.holdings(&HoldingsQuery::single(holding_id)).await?;
    Ok(holdings.into_iter().next())
}

/// Balance the user holds of one asset. An empty answer means unknown.
pub async fn available_balance(
    api: &dyn AdminApi,
    user_id: &str,
    holding_id: i64,
) -> Result<Option<f64>, ApiError> {
    let lines = api
        .user_holdings(&UserHoldingsQuery::balance_of(user_id, holding_id))
        .await?;
    Ok(lines.into_iter().next().and_then(|line| line.balance))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::model::{HoldingRef, UserHolding};
    use std::cell::RefCell;
    use std::rc::Rc;

    pub type SharedModal<F> = Rc<RefCell<OperationModal<F>>>;

    impl<F: OperationForm> ModalStore for SharedModal<F> {
        type Form = F;

        fn update<R>(&mut self, change: impl FnOnce(&mut OperationModal<F>) -> R) -> R {
            change(&mut self.borrow_mut())
        }
    }

    pub fn catalog() -> Vec<MovementType> {
        vec![
            MovementType { id: 1, code: "deposito".into(), name: "Deposit".into() },
            MovementType { id: 2, code: "retiro".into(), name: "Withdrawal".into() },
            MovementType { id: 3, code: "transferencia".into(), name: "Transfer".into() },
        ]
    }

    pub fn ctx() -> SubmitContext {
        SubmitContext {
            user_id: "u-1".into(),
            user_email: "ana@example.com".into(),
            movement_types: catalog(),
        }
    }

    pub fn holding(id: i64, name: &str, price: Option<f64>, static_price: bool) -> Holding {
        Holding {
            holding_id: id,
            name: name.into(),
            price,
            static_price,
        }
    }

    pub fn user_holding(account_id: &str, id: i64, name: &str, balance: Option<f64>) -> UserHolding {
        UserHolding {
            account_holding_id: account_id.into(),
            holding_id: HoldingRef {
                holding_id: id,
                name: name.into(),
            },
            balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::deposit::DepositForm;
    use super::testing::*;
    use super::withdraw::WithdrawForm;
    use super::*;
    use crate::api::fake::RecordingApi;

    fn two_assets() -> Vec<AssetChoice> {
        vec![
            AssetChoice { value: "10".into(), label: "USDT".into(), holding_id: 10 },
            AssetChoice { value: "20".into(), label: "BTC".into(), holding_id: 20 },
        ]
    }

    fn withdraw_ready() -> OperationModal<WithdrawForm> {
        let mut modal = OperationModal::<WithdrawForm>::default();
        let ticket = modal.open();
        modal.assets_loaded(ticket, Ok(two_assets()));
        modal
    }

    #[test]
    fn test_operation_codes() {
        assert_eq!(OperationKind::from_code("deposito"), Some(OperationKind::Deposit));
        assert_eq!(OperationKind::from_code("retiro"), Some(OperationKind::Withdraw));
        assert_eq!(OperationKind::from_code("transferencia"), Some(OperationKind::Transfer));
        assert_eq!(OperationKind::from_code("conversion"), Some(OperationKind::Conversion));
        assert_eq!(OperationKind::from_code("fee"), None);
    }

    #[test]
    fn test_phases_through_selection() {
        let mut modal = OperationModal::<WithdrawForm>::default();
        assert_eq!(modal.phase(), &Phase::Closed);
        let ticket = modal.open();
        assert_eq!(modal.phase(), &Phase::LoadingAssets);
        modal.assets_loaded(ticket, Ok(two_assets()));
        assert_eq!(modal.phase(), &Phase::Idle);

        let (ticket, holding_id) = modal.select_asset("20").unwrap();
        assert_eq!(holding_id, 20);
        assert_eq!(modal.phase(), &Phase::LoadingDeps);

        modal.apply_price(ticket, Some(holding(20, "BTC", Some(65000.0), false)));
        assert_eq!(modal.phase(), &Phase::LoadingDeps);
        modal.apply_balance(ticket, Some(0.5));
        assert_eq!(modal.phase(), &Phase::Ready);
        assert_eq!(modal.draft.rate.value(), "65000");
        assert_eq!(modal.draft.available, Some(0.5));
    }

    #[test]
    fn test_stale_selection_is_discarded() {
        let mut modal = withdraw_ready();
        let (first, _) = modal.select_asset("10").unwrap();
        let (second, _) = modal.select_asset("20").unwrap();

        // answers for the first pick arrive late
        assert!(!modal.apply_price(first, Some(holding(10, "USDT", Some(1.0), true))));
        assert!(!modal.apply_balance(first, Some(999.0)));
        assert_eq!(modal.draft.available, None);
        assert!(!modal.draft.rate.is_locked());

        assert!(modal.apply_price(second, Some(holding(20, "BTC", Some(65000.0), false))));
        assert!(modal.apply_balance(second, Some(0.5)));
        assert_eq!(modal.draft.available, Some(0.5));
    }

    #[test]
    fn test_stale_session_is_discarded() {
        let mut modal = OperationModal::<DepositForm>::default();
        let old = modal.open();
        modal.close();
        let current = modal.open();
        assert!(!modal.assets_loaded(old, Ok(two_assets())));
        assert_eq!(modal.phase(), &Phase::LoadingAssets);
        assert!(modal.assets_loaded(current, Ok(Vec::new())));
        assert_eq!(modal.phase(), &Phase::Idle);
    }

    #[test]
    fn test_unknown_lookups_keep_defaults() {
        let mut modal = withdraw_ready();
        modal.draft.rate.edit("2.5");
        let (ticket, _) = modal.select_asset("10").unwrap();
        modal.apply_price(ticket, None);
        modal.apply_balance(ticket, None);
        assert_eq!(modal.phase(), &Phase::Ready);
        assert_eq!(modal.draft.rate.value(), "2.5");
        assert_eq!(modal.draft.available, None);
    }

    #[test]
    fn test_clearing_selection_returns_to_idle() {
        let mut modal = withdraw_ready();
        modal.select_asset("10");
        assert_eq!(modal.select_asset(""), None);
        assert_eq!(modal.phase(), &Phase::Idle);
        assert!(modal.selected_asset().is_none());
    }

    #[test]
    fn test_submit_blocked_while_loading() {
        let mut modal = withdraw_ready();
        modal.select_asset("10");
        assert_eq!(modal.begin_submit(&ctx()), Err(FormError::Busy));
        assert_eq!(modal.phase(), &Phase::LoadingDeps);
    }

    #[test]
    fn test_failure_can_be_dismissed() {
        let mut modal = withdraw_ready();
        assert_eq!(modal.begin_submit(&ctx()), Err(FormError::SelectAsset));
        assert_eq!(modal.error(), Some("Select an asset"));
        modal.dismiss_error();
        assert_eq!(modal.phase(), &Phase::Idle);
    }

    #[test]
    fn test_asset_locked_while_submitting() {
        let mut modal = withdraw_ready();
        let (ticket, _) = modal.select_asset("10").unwrap();
        modal.apply_price(ticket, None);
        modal.apply_balance(ticket, Some(5.0));
        modal.draft.edit_amount("1");
        let session = modal.session();
        assert!(modal.begin_submit(&ctx()).is_ok());

        assert_eq!(modal.select_asset("20"), None);
        assert_eq!(modal.phase(), &Phase::Submitting);
        assert_eq!(modal.draft.asset.as_deref(), Some("10"));
        assert_eq!(modal.begin_submit(&ctx()), Err(FormError::Busy));

        // a rejected submit leaves the original pick usable
        assert!(!modal.finish_submit(session, Err(ApiError::MissingToken)));
        let (ticket, holding_id) = modal.select_asset("20").unwrap();
        assert_eq!(holding_id, 20);
        assert!(modal.apply_price(ticket, None));
        assert!(modal.apply_balance(ticket, Some(1.0)));
        assert_eq!(modal.phase(), &Phase::Ready);
    }

    #[test]
    fn test_late_submit_result_after_close() {
        let mut modal = withdraw_ready();
        let (ticket, _) = modal.select_asset("10").unwrap();
        modal.apply_price(ticket, None);
        modal.apply_balance(ticket, Some(5.0));
        modal.draft.edit_amount("1");
        let session = modal.session();
        assert!(modal.begin_submit(&ctx()).is_ok());
        modal.close();

        assert!(modal.finish_submit(session, Ok(())));
        assert_eq!(modal.phase(), &Phase::Closed);
        assert!(!modal.auto_close(session));
    }

    #[tokio::test]
    async fn test_empty_lookups_mean_unknown() {
        let api = RecordingApi::default();
        assert_eq!(price_quote(&api, 10).await.unwrap(), None);
        assert_eq!(available_balance(&api, "u-1", 10).await.unwrap(), None);

        api.user_holdings
            .borrow_mut()
            .push_back(vec![user_holding("a-1", 10, "USDT", Some(42.0))]);
        assert_eq!(available_balance(&api, "u-1", 10).await.unwrap(), Some(42.0));
        assert_eq!(api.call_count(), 3);
    }
}
