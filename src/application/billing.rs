//! Billing webhook event application.
//!
//! Subscription lifecycle events reset the owning user's credit balance:
//! an active subscription grants the unlimited sentinel, cancellation and
//! deletion fall back to the free tier.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::repos::{
    RepoError, SubscriptionsRepo, UpsertSubscriptionParams, UsersRepo,
};
use crate::domain::types::Credits;

pub const SUBSCRIPTION_STATUS_ACTIVE: &str = "active";
pub const SUBSCRIPTION_STATUS_CANCELED: &str = "canceled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    /// Checkout completed: the provider minted a customer for a known user.
    CheckoutCompleted {
        user_id: Uuid,
        customer_id: String,
        subscription_id: Option<String>,
    },
    SubscriptionUpdated {
        customer_id: String,
        subscription_id: Option<String>,
        status: String,
    },
    SubscriptionDeleted {
        customer_id: String,
    },
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct BillingService {
    subscriptions: Arc<dyn SubscriptionsRepo>,
    users: Arc<dyn UsersRepo>,
    free_tier_credits: i64,
}

impl BillingService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionsRepo>,
        users: Arc<dyn UsersRepo>,
        free_tier_credits: i64,
    ) -> Self {
        Self {
            subscriptions,
            users,
            free_tier_credits,
        }
    }

    pub async fn apply(&self, event: BillingEvent) -> Result<(), BillingError> {
        match event {
            BillingEvent::CheckoutCompleted {
                user_id,
                customer_id,
                subscription_id,
            } => {
                self.subscriptions
                    .upsert_subscription(UpsertSubscriptionParams {
                        user_id,
                        customer_id: customer_id.clone(),
                        subscription_id,
                        status: SUBSCRIPTION_STATUS_ACTIVE.to_string(),
                    })
                    .await?;
                self.users
                    .set_credits(user_id, Credits::unlimited())
                    .await?;
                info!(
                    target = "recibo::billing",
                    user_id = %user_id,
                    customer_id = %customer_id,
                    "checkout completed; unlimited credits granted"
                );
            }
            BillingEvent::SubscriptionUpdated {
                customer_id,
                subscription_id,
                status,
            } => {
                let Some(subscription) =
                    self.subscriptions.find_by_customer(&customer_id).await?
                else {
                    warn!(
                        target = "recibo::billing",
                        customer_id = %customer_id,
                        "subscription event for unknown customer ignored"
                    );
                    return Ok(());
                };

                self.subscriptions
                    .upsert_subscription(UpsertSubscriptionParams {
                        user_id: subscription.user_id,
                        customer_id: customer_id.clone(),
                        subscription_id,
                        status: status.clone(),
                    })
                    .await?;

                let credits = if status == SUBSCRIPTION_STATUS_ACTIVE {
                    Credits::unlimited()
                } else {
                    Credits(self.free_tier_credits)
                };
                self.users
                    .set_credits(subscription.user_id, credits)
                    .await?;
                info!(
                    target = "recibo::billing",
                    customer_id = %customer_id,
                    status = %status,
                    credits = credits.get(),
                    "subscription updated"
                );
            }
            BillingEvent::SubscriptionDeleted { customer_id } => {
                let Some(subscription) =
                    self.subscriptions.find_by_customer(&customer_id).await?
                else {
                    warn!(
                        target = "recibo::billing",
                        customer_id = %customer_id,
                        "deletion event for unknown customer ignored"
                    );
                    return Ok(());
                };

                self.subscriptions
                    .set_status(&customer_id, SUBSCRIPTION_STATUS_CANCELED)
                    .await?;
                self.users
                    .set_credits(subscription.user_id, Credits(self.free_tier_credits))
                    .await?;
                info!(
                    target = "recibo::billing",
                    customer_id = %customer_id,
                    "subscription deleted; reset to free tier"
                );
            }
        }
        Ok(())
    }
}
