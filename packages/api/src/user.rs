//! User management types: `POST /friends/insert` and `DELETE /friends/delete`.

use serde::{Deserialize, Serialize};

/// Request body for both user management endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRequest {
    pub user_id: String,
}

/// Response body for `POST /friends/insert`.
///
/// `location` mirrors the `Location` header: the friend list of the new user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsertUserResponse {
    pub user_id: String,
    pub location: String,
}
