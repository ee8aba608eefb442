//! Waste pickup request actions

use shared::error::{AppError, ErrorCode};
use shared::models::{Supply, SupplyAction, SupplyStatus};
use shared::util::now_millis;
use sqlx::PgPool;

use crate::db;
use crate::error::ServiceResult;
use crate::notify::{self, Notifier, templates};

/// Resulting status if `user_id` may perform `action` on `supply`.
///
/// Accept and reject are open to any farmer while pending; complete only to
/// the farmer who accepted; cancel only to the producer who asked.
pub fn check_action(supply: &Supply, user_id: &str, action: SupplyAction) -> Result<SupplyStatus, AppError> {
    let allowed = match action {
        SupplyAction::Accept | SupplyAction::Reject => supply.producer_id != user_id,
        SupplyAction::Complete => supply.farmer_id.as_deref() == Some(user_id),
        SupplyAction::Cancel => supply.producer_id == user_id,
    };
    if !allowed {
        return Err(AppError::new(ErrorCode::SupplyNotFound));
    }
    supply.status.apply(action).ok_or_else(|| {
        AppError::new(ErrorCode::InvalidSupplyTransition)
            .with_detail("status", supply.status.as_db())
            .with_detail("action", action.name())
    })
}

pub async fn apply(
    pool: &PgPool,
    notifier: &dyn Notifier,
    user_id: &str,
    supply_id: i64,
    action: SupplyAction,
) -> ServiceResult<Supply> {
    let supply = db::supplies::find(pool, supply_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SupplyNotFound))?;
    let target = check_action(&supply, user_id, action)?;

    let farmer_id = match action {
        SupplyAction::Accept | SupplyAction::Reject => Some(user_id),
        _ => None,
    };
    let updated = db::supplies::transition(pool, supply.id, supply.status, target, farmer_id, now_millis())
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::InvalidSupplyTransition).with_detail("action", action.name())
        })?;

    tracing::info!(
        supply_id = supply.id,
        from = supply.status.as_db(),
        to = target.as_db(),
        "Supply request updated"
    );

    let message = match target {
        SupplyStatus::Accepted => {
            let farmer = db::profiles::display_name(pool, user_id)
                .await?
                .unwrap_or_else(|| "peternak".to_string());
            Some(templates::supply_accepted(&updated.waste_type, updated.weight_kg, &farmer))
        }
        SupplyStatus::Rejected => Some(templates::supply_rejected(&updated.waste_type, updated.weight_kg)),
        SupplyStatus::Completed => Some(templates::supply_completed(&updated.waste_type, updated.weight_kg)),
        _ => None,
    };
    if let Some(message) = message {
        let phone = db::profiles::phone_of(pool, &updated.producer_id).await?;
        notify::dispatch(notifier, phone.as_deref(), &message).await;
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn supply(status: SupplyStatus, farmer_id: Option<&str>) -> Supply {
        Supply {
            id: 1,
            producer_id: "producer".into(),
            farmer_id: farmer_id.map(Into::into),
            waste_type: "ampas tahu".into(),
            weight_kg: Decimal::new(125, 1),
            pickup_address_id: 7,
            pickup_date: 1_792_281_600_000,
            notes: None,
            status,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_any_farmer_may_accept_pending() {
        let s = supply(SupplyStatus::Pending, None);
        assert_eq!(check_action(&s, "farmer-a", SupplyAction::Accept).unwrap(), SupplyStatus::Accepted);
        assert_eq!(check_action(&s, "farmer-b", SupplyAction::Reject).unwrap(), SupplyStatus::Rejected);
        // a producer cannot accept their own request
        assert!(check_action(&s, "producer", SupplyAction::Accept).is_err());
    }

    #[test]
    fn test_only_assigned_farmer_completes() {
        let s = supply(SupplyStatus::Accepted, Some("farmer-a"));
        assert_eq!(check_action(&s, "farmer-a", SupplyAction::Complete).unwrap(), SupplyStatus::Completed);
        assert_eq!(
            check_action(&s, "farmer-b", SupplyAction::Complete).unwrap_err().code,
            ErrorCode::SupplyNotFound
        );
    }

    #[test]
    fn test_producer_cancels_only_pending() {
        let pending = supply(SupplyStatus::Pending, None);
        assert_eq!(check_action(&pending, "producer", SupplyAction::Cancel).unwrap(), SupplyStatus::Cancelled);

        let accepted = supply(SupplyStatus::Accepted, Some("farmer-a"));
        let err = check_action(&accepted, "producer", SupplyAction::Cancel).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSupplyTransition);
        assert_eq!(err.details.unwrap()["status"], "accepted");
    }

    #[test]
    fn test_accepted_cannot_be_accepted_again() {
        let s = supply(SupplyStatus::Accepted, Some("farmer-a"));
        assert_eq!(
            check_action(&s, "farmer-b", SupplyAction::Accept).unwrap_err().code,
            ErrorCode::InvalidSupplyTransition
        );
    }
}
