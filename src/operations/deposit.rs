use super::{AssetChoice, Draft, OperationForm, OperationKind, SubmitContext, movement_type, parse_amount};
use crate::api::{AdminApi, HoldingsQuery, ManualMovementRequest};
use crate::error::{ApiError, FormError};

/// Manual deposit of an externally paired asset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepositForm;

impl OperationForm for DepositForm {
    type Payload = ManualMovementRequest;

    const KIND: OperationKind = OperationKind::Deposit;
    const TRACKS_BALANCE: bool = false;
    const TAKES_TX_HASH: bool = true;

    fn build_payload(
        &self,
        draft: &Draft,
        asset: Option<&AssetChoice>,
        ctx: &SubmitContext,
    ) -> Result<ManualMovementRequest, FormError> {
        let asset = asset.ok_or(FormError::SelectAsset)?;
        let amount = parse_amount(&draft.amount)?;
        let price_usd = draft.rate.parse()?;
        let movement_type_id = movement_type(ctx, OperationKind::Deposit.code())?;

        Ok(ManualMovementRequest {
            user_id: ctx.user_id.clone(),
            amount,
            movement_type_id,
            tx_hash: draft.tx_hash.clone(),
            notes: draft.notes.clone(),
            asset_provided_id: asset.holding_id,
            price_usd,
        })
    }
}

/// Assets that can come in from outside the platform
pub async fn load_assets(api: &dyn AdminApi) -> Result<Vec<AssetChoice>, ApiError> {
    let holdings = api.holdings(&HoldingsQuery::externally_paired()).await?;
    Ok(holdings
        .into_iter()
        .map(|h| AssetChoice {
            value: h.holding_id.to_string(),
            label: h.name,
            holding_id: h.holding_id,
        })
        .collect())
}

pub async fn submit(api: &dyn AdminApi, payload: &ManualMovementRequest) -> Result<(), ApiError> {
    api.manual_deposit(payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::RecordingApi;
    use crate::operations::testing::*;
    use crate::operations::{OperationModal, Phase, settle_submit};
    use crate::utils::sleep;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;
    use tokio::time::Instant;

    async fn ready_modal(api: &RecordingApi) -> OperationModal<DepositForm> {
        api.holdings
            .borrow_mut()
            .push_back(vec![holding(3, "USDT", Some(1.0), true), holding(4, "BTC", None, false)]);
        api.holdings
            .borrow_mut()
            .push_back(vec![holding(3, "USDT", Some(1.0), true)]);

        let mut modal = OperationModal::<DepositForm>::default();
        let ticket = modal.open();
        modal.assets_loaded(ticket, load_assets(api).await);
        let (ticket, holding_id) = modal.select_asset("3").unwrap();
        let quote = crate::operations::price_quote(api, holding_id).await.unwrap();
        modal.apply_price(ticket, quote);
        modal
    }

    #[tokio::test(start_paused = true)]
    async fn test_deposit_sends_numeric_amount_then_closes() {
        let api = RecordingApi::default();
        let modal: SharedModal<DepositForm> = Rc::new(RefCell::new(ready_modal(&api).await));
        let (session, payload) = {
            let mut state = modal.borrow_mut();
            assert_eq!(state.phase(), &Phase::Ready);
            assert!(state.draft.rate.is_locked());
            state.draft.edit_amount("100");
            state.draft.notes = "wire 42".into();
            let payload = state.begin_submit(&ctx()).unwrap();
            assert_eq!(state.phase(), &Phase::Submitting);
            (state.session(), payload)
        };

        let close_delay = Duration::from_millis(1200);
        let started = Instant::now();
        let completed = Cell::new(None);
        let watcher = modal.clone();
        let (accepted, midway) = tokio::join!(
            settle_submit(modal.clone(), session, submit(&api, &payload), close_delay, |kind| {
                completed.set(Some((kind, started.elapsed())));
            }),
            async move {
                sleep(Duration::from_millis(600)).await;
                let state = watcher.borrow();
                (state.phase().clone(), state.draft.amount.clone())
            }
        );

        assert!(accepted);
        // the ledger is told right away, before the success message goes
        assert_eq!(completed.get(), Some((OperationKind::Deposit, Duration::ZERO)));
        assert_eq!(midway, (Phase::Succeeded, String::new()));
        assert_eq!(modal.borrow().phase(), &Phase::Closed);
        assert!(started.elapsed() >= close_delay);

        let sent = api.deposits.borrow()[0].clone();
        let body = serde_json::to_value(&sent).unwrap();
        assert!(body["amount"].is_number());
        assert_eq!(body["amount"].as_f64(), Some(100.0));
        assert_eq!(body["movementTypeId"], serde_json::json!(1));
        assert_eq!(body["assetProvidedId"], serde_json::json!(3));
        assert_eq!(body["price_usd"].as_f64(), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopened_modal_is_not_auto_closed() {
        let api = RecordingApi::default();
        let modal: SharedModal<DepositForm> = Rc::new(RefCell::new(ready_modal(&api).await));
        let (session, payload) = {
            let mut state = modal.borrow_mut();
            state.draft.edit_amount("1");
            (state.session(), state.begin_submit(&ctx()).unwrap())
        };

        let reopener = modal.clone();
        let (accepted, _) = tokio::join!(
            settle_submit(modal.clone(), session, submit(&api, &payload), Duration::from_millis(1200), |_| {}),
            async move {
                sleep(Duration::from_millis(300)).await;
                let mut state = reopener.borrow_mut();
                state.close();
                state.open();
            }
        );

        assert!(accepted);
        assert_eq!(modal.borrow().phase(), &Phase::LoadingAssets);
    }

    #[tokio::test]
    async fn test_missing_movement_type_is_an_error() {
        let api = RecordingApi::default();
        let mut modal = ready_modal(&api).await;
        modal.draft.edit_amount("5");
        let mut context = ctx();
        context.movement_types.retain(|mt| mt.code != "deposito");

        let err = modal.begin_submit(&context).unwrap_err();
        assert_eq!(err, FormError::MissingMovementType("deposito"));
        assert_eq!(modal.error(), Some("Movement type \"deposito\" not found"));
        assert!(api.deposits.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_rejection_is_shown() {
        let api = RecordingApi::default();
        let modal: SharedModal<DepositForm> = Rc::new(RefCell::new(ready_modal(&api).await));
        *api.reject_with.borrow_mut() = Some("Asset disabled".into());
        let (session, payload) = {
            let mut state = modal.borrow_mut();
            state.draft.edit_amount("5");
            (state.session(), state.begin_submit(&ctx()).unwrap())
        };

        let started = Instant::now();
        let mut notified = false;
        let accepted = settle_submit(
            modal.clone(),
            session,
            submit(&api, &payload),
            Duration::from_millis(1200),
            |_| notified = true,
        )
        .await;

        assert!(!accepted);
        assert!(!notified);
        assert_eq!(started.elapsed(), Duration::ZERO);
        let state = modal.borrow();
        assert_eq!(state.error(), Some("Asset disabled"));
        // the draft survives a rejection
        assert_eq!(state.draft.amount, "5");
    }
}
