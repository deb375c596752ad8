use serde::{Deserialize, Serialize};

use shared_models::clinic::UserRecord;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminStatus {
    pub admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertUserResponse {
    pub result: UserRecord,
    pub token: String,
}
