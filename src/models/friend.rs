use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FriendRequest {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: String,
    pub created_at: String,
}

/// 친구 관계는 한 쌍당 한 행만 저장합니다.
/// `user_id`는 요청을 보낸 사람, `friend_id`는 수락한 사람입니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Friendship {
    pub id: String,
    pub user_id: String,
    pub friend_id: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SendFriendRequest {
    pub user_id: String,
}

/// 친구 목록 항목 (친구에게 공개되는 필드만)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FriendSummary {
    pub id: String,
    pub username: String,
    pub full_name: String,
}
