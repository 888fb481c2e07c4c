use super::{AssetChoice, Draft, OperationForm, OperationKind, SubmitContext, movement_type, parse_amount};
use crate::api::{AdminApi, ManualMovementRequest, UserHoldingsQuery};
use crate::error::{ApiError, FormError};
use crate::model::UserHolding;

/// Manual withdrawal from one of the user's externally paired holdings.
///
/// The dropdown is keyed by account holding id, while lookups and the
/// payload use the underlying numeric holding id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WithdrawForm;

impl OperationForm for WithdrawForm {
    type Payload = ManualMovementRequest;

    const KIND: OperationKind = OperationKind::Withdraw;
    const TRACKS_BALANCE: bool = true;
    const TAKES_TX_HASH: bool = true;

    fn build_payload(
        &self,
        draft: &Draft,
        asset: Option<&AssetChoice>,
        ctx: &SubmitContext,
    ) -> Result<ManualMovementRequest, FormError> {
        if draft.asset.is_none() {
            return Err(FormError::SelectAsset);
        }
        let amount = parse_amount(&draft.amount)?;
        let movement_type_id = movement_type(ctx, OperationKind::Withdraw.code())?;
        let asset = asset.ok_or(FormError::AssetNotFound)?;
        let price_usd = draft.rate.parse()?;

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

fn choice(line: UserHolding) -> AssetChoice {
    let label = match line.balance {
        Some(balance) => format!("{} (Available: {})", line.holding_id.name, balance),
        None => line.holding_id.name.clone(),
    };
    AssetChoice {
        value: line.account_holding_id,
        label,
        holding_id: line.holding_id.holding_id,
    }
}

/// Visible, externally paired holdings with a balance left after pending requests
pub async fn load_assets(api: &dyn AdminApi, user_id: &str) -> Result<Vec<AssetChoice>, ApiError> {
    let lines = api
        .user_holdings(&UserHoldingsQuery::withdrawable(user_id))
        .await?;
    Ok(lines.into_iter().map(choice).collect())
}

pub async fn submit(api: &dyn AdminApi, payload: &ManualMovementRequest) -> Result<(), ApiError> {
    api.manual_withdraw(payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::RecordingApi;
    use crate::operations::testing::*;
    use crate::operations::{OperationModal, Phase, available_balance, price_quote};

    #[tokio::test]
    async fn test_no_asset_fails_without_request() {
        let api = RecordingApi::default();
        let mut modal = OperationModal::<WithdrawForm>::default();
        modal.open();
        // assets never arrived: still loading, the submit button is disabled
        assert_eq!(modal.begin_submit(&ctx()), Err(FormError::Busy));

        let ticket = modal.open();
        modal.assets_loaded(ticket, Ok(Vec::new()));
        modal.draft.edit_amount("10");
        assert_eq!(modal.begin_submit(&ctx()), Err(FormError::SelectAsset));
        assert_eq!(modal.error(), Some("Select an asset"));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_withdraw_uses_numeric_holding_id() {
        let api = RecordingApi::default();
        api.user_holdings
            .borrow_mut()
            .push_back(vec![user_holding("ah-77", 5, "ETH", Some(2.0))]);
        api.holdings
            .borrow_mut()
            .push_back(vec![holding(5, "ETH", Some(3000.0), false)]);
        api.user_holdings
            .borrow_mut()
            .push_back(vec![user_holding("ah-77", 5, "ETH", Some(1.5))]);

        let mut modal = OperationModal::<WithdrawForm>::default();
        let ticket = modal.open();
        modal.assets_loaded(ticket, load_assets(&api, "u-1").await);
        assert_eq!(modal.assets()[0].label, "ETH (Available: 2)");

        let (ticket, holding_id) = modal.select_asset("ah-77").unwrap();
        assert_eq!(holding_id, 5);
        modal.apply_price(ticket, price_quote(&api, holding_id).await.unwrap());
        modal.apply_balance(ticket, available_balance(&api, "u-1", holding_id).await.unwrap());
        assert_eq!(modal.phase(), &Phase::Ready);
        assert_eq!(modal.draft.available, Some(1.5));
        assert_eq!(modal.draft.rate.value(), "3000");

        modal.draft.edit_amount("0.25");
        let session = modal.session();
        let payload = modal.begin_submit(&ctx()).unwrap();
        assert!(modal.finish_submit(session, submit(&api, &payload).await));

        let sent = api.withdrawals.borrow()[0].clone();
        assert_eq!(sent.asset_provided_id, 5);
        assert_eq!(sent.movement_type_id, 2);
        assert_eq!(sent.amount, 0.25);
        assert_eq!(sent.price_usd, 3000.0);
    }

    #[test]
    fn test_invalid_amount_rejected_before_type_lookup() {
        let mut modal = OperationModal::<WithdrawForm>::default();
        let ticket = modal.open();
        modal.assets_loaded(
            ticket,
            Ok(vec![AssetChoice { value: "ah-1".into(), label: "ETH".into(), holding_id: 5 }]),
        );
        let (ticket, _) = modal.select_asset("ah-1").unwrap();
        modal.apply_price(ticket, None);
        modal.apply_balance(ticket, None);

        let context = SubmitContext { movement_types: Vec::new(), ..ctx() };
        assert_eq!(modal.begin_submit(&context), Err(FormError::InvalidAmount));
        modal.draft.edit_amount("3");
        assert_eq!(
            modal.begin_submit(&context),
            Err(FormError::MissingMovementType("retiro"))
        );
    }
}
