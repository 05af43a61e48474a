use crate::domain::UserId;

// ============== Authorization ==============

/// An empty allow-list admits everyone; otherwise the sender must be listed.
pub fn is_authorized(user_id: Option<UserId>, allowed_users: &[i64]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }
    let Some(user_id) = user_id else {
        return false;
    };
    allowed_users.contains(&user_id.0)
}
