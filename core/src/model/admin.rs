// lustre/src/model/admin.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
  pub enum AdminRole ("admin role") {
    Support => "support",
    Admin => "admin",
    SuperAdmin => "super_admin",
  }
}

/// Back-office account row. Only active accounts may mutate order or refund state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
  pub user_id: Uuid,
  pub email: String,
  pub role: AdminRole,
  pub is_active: bool,
}
