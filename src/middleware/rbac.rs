//! Role-based access control extractors for Axum handlers.
//!
//! Administrative capability gates rule editing at the edit boundary only;
//! dispatch evaluates all active rules regardless of author.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::user::UserRole;
use crate::AppState;

/// Extractor that requires the Org_Admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::OrgAdmin {
            return Err(AppError::Forbidden(
                "Organization admin access required".to_string(),
            ));
        }
        Ok(RequireAdmin(user))
    }
}

/// Extractor that requires Org_Admin or Inventory_Manager role.
#[derive(Debug, Clone)]
pub struct RequireManager(pub CurrentUser);

impl FromRequestParts<AppState> for RequireManager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        match user.role {
            UserRole::OrgAdmin | UserRole::InventoryManager => Ok(RequireManager(user)),
            _ => Err(AppError::Forbidden(
                "Manager or admin access required".to_string(),
            )),
        }
    }
}
