use super::{AssetChoice, Draft, OperationForm, OperationKind, RecipientSearch, SubmitContext, parse_amount};
use crate::api::{AdminApi, TransferRequest, UserHoldingsQuery};
use crate::error::{ApiError, FormError};
use crate::model::UserSummary;

/// Internal transfer of a non externally paired holding to another user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferForm {
    pub recipient: RecipientSearch,
}

impl OperationForm for TransferForm {
    type Payload = TransferRequest;

    const KIND: OperationKind = OperationKind::Transfer;
    const TRACKS_BALANCE: bool = true;
    const TAKES_TX_HASH: bool = false;

    fn build_payload(
        &self,
        draft: &Draft,
        asset: Option<&AssetChoice>,
        ctx: &SubmitContext,
    ) -> Result<TransferRequest, FormError> {
        let typed_email = self.recipient.text().trim();
        let (Some(recipient), Some(asset)) = (self.recipient.recipient(), asset) else {
            return Err(FormError::Incomplete);
        };
        if ctx.user_id.is_empty()
            || typed_email.is_empty()
            || draft.amount.is_empty()
            || draft.rate.value().is_empty()
        {
            return Err(FormError::Incomplete);
        }
        let amount = parse_amount(&draft.amount)?;
        let price_usd = draft.rate.parse()?;
        if !recipient.email.eq_ignore_ascii_case(typed_email) {
            return Err(FormError::RecipientMismatch);
        }

        Ok(TransferRequest {
            sender_user_id: ctx.user_id.clone(),
            receiver_user_id: recipient.id.clone(),
            holding_id: asset.holding_id,
            amount,
            price_usd,
            sender_email: ctx.user_email.clone(),
            receiver_email: typed_email.to_string(),
            tx_hash: String::new(),
            notes: draft.notes.clone(),
        })
    }
}

/// Visible internal holdings with a balance left after pending requests
pub async fn load_assets(api: &dyn AdminApi, user_id: &str) -> Result<Vec<AssetChoice>, ApiError> {
    let lines = api
        .user_holdings(&UserHoldingsQuery::transferable(user_id))
        .await?;
    Ok(lines
        .into_iter()
        .map(|line| AssetChoice {
            value: line.holding_id.holding_id.to_string(),
            label: line.holding_id.name,
            holding_id: line.holding_id.holding_id,
        })
        .collect())
}

/// Typeahead lookup for the recipient field
pub async fn find_recipients(api: &dyn AdminApi, query: &str) -> Vec<UserSummary> {
    match api.search_users(query).await {
        Ok(users) => users,
        Err(e) => {
            log::warn!("Recipient lookup failed: {}", e);
            Vec::new()
        }
    }
}

pub async fn submit(api: &dyn AdminApi, payload: &TransferRequest) -> Result<(), ApiError> {
    api.transfer(payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::RecordingApi;
    use crate::operations::testing::*;
    use crate::operations::{OperationModal, Phase, available_balance, price_quote};

    fn bo() -> UserSummary {
        UserSummary {
            id: "u-2".into(),
            email: "bo@example.com".into(),
            name: "Bo".into(),
        }
    }

    async fn ready_modal(api: &RecordingApi) -> OperationModal<TransferForm> {
        api.user_holdings
            .borrow_mut()
            .push_back(vec![user_holding("ah-1", 8, "USDC", Some(50.0))]);
        api.user_holdings
            .borrow_mut()
            .push_back(vec![user_holding("ah-1", 8, "USDC", Some(40.0))]);
        api.holdings
            .borrow_mut()
            .push_back(vec![holding(8, "USDC", Some(1.0), true)]);

        let mut modal = OperationModal::<TransferForm>::default();
        let ticket = modal.open();
        modal.assets_loaded(ticket, load_assets(api, "u-1").await);
        let (ticket, holding_id) = modal.select_asset("8").unwrap();
        modal.apply_balance(ticket, available_balance(api, "u-1", holding_id).await.unwrap());
        modal.apply_price(ticket, price_quote(api, holding_id).await.unwrap());
        modal
    }

    #[tokio::test]
    async fn test_transfer_requires_resolved_recipient() {
        let api = RecordingApi::default();
        let mut modal = ready_modal(&api).await;
        assert_eq!(modal.phase(), &Phase::Ready);
        assert_eq!(modal.draft.available, Some(40.0));
        assert!(modal.draft.rate.is_locked());

        modal.draft.edit_amount("10");
        modal.form.recipient.edit("bo@example.com");
        assert_eq!(modal.begin_submit(&ctx()), Err(FormError::Incomplete));
        assert!(api.transfers.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_transfer_payload() {
        let api = RecordingApi::default();
        *api.candidates.borrow_mut() = vec![bo()];
        let mut modal = ready_modal(&api).await;

        modal.form.recipient.edit("bo");
        assert!(modal.form.recipient.begin_lookup("bo"));
        let found = find_recipients(&api, "bo").await;
        modal.form.recipient.finish_lookup("bo", found);
        let chosen = modal.form.recipient.candidates()[0].clone();
        modal.form.recipient.choose(&chosen);

        modal.draft.edit_amount("10");
        modal.draft.notes = "rent".into();
        let session = modal.session();
        let payload = modal.begin_submit(&ctx()).unwrap();
        assert!(modal.finish_submit(session, submit(&api, &payload).await));
        assert_eq!(modal.phase(), &Phase::Succeeded);
        assert_eq!(modal.form.recipient.text(), "");

        let sent = api.transfers.borrow()[0].clone();
        assert_eq!(sent.sender_user_id, "u-1");
        assert_eq!(sent.receiver_user_id, "u-2");
        assert_eq!(sent.sender_email, "ana@example.com");
        assert_eq!(sent.receiver_email, "bo@example.com");
        assert_eq!(sent.holding_id, 8);
        assert_eq!(sent.amount, 10.0);
        assert_eq!(sent.price_usd, 1.0);
        assert_eq!(sent.tx_hash, "");
    }

    #[tokio::test]
    async fn test_recipient_text_must_match_resolved_user() {
        let api = RecordingApi::default();
        let mut modal = ready_modal(&api).await;
        modal.draft.edit_amount("10");

        modal.form.recipient = RecipientSearch::resolved_as("cy@example.com", &bo());
        assert_eq!(modal.begin_submit(&ctx()), Err(FormError::RecipientMismatch));
        assert_eq!(
            modal.error(),
            Some("Recipient email does not match the selected user")
        );
        modal.dismiss_error();

        // the typed text is compared trimmed and case-insensitively
        modal.form.recipient = RecipientSearch::resolved_as(" Bo@Example.com ", &bo());
        let payload = modal.begin_submit(&ctx()).unwrap();
        assert_eq!(payload.receiver_user_id, "u-2");
        assert_eq!(payload.receiver_email, "Bo@Example.com");
        assert!(api.transfers.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_failed_lookup_yields_no_candidates() {
        let api = RecordingApi::default();
        *api.reject_with.borrow_mut() = Some("boom".into());
        assert!(find_recipients(&api, "bo").await.is_empty());
    }
}
