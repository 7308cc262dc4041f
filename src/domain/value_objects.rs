use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 予約ID - 予約管理コンテキストの集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(Uuid);

impl ReservationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 書籍ID - カタログ管理コンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

/// 読者ID - 読者管理コンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReaderId(Uuid);

impl ReaderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for ReaderId {
    fn default() -> Self {
        Self::new()
    }
}

/// 図書カードID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibCardId(Uuid);

impl LibCardId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for LibCardId {
    fn default() -> Self {
        Self::new()
    }
}

/// 書籍の希少度
///
/// 予約・延長の可否を制限する：
/// - Unique は予約不可
/// - Rare, Unique は延長不可
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Unique,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Unique => "unique",
        }
    }

    /// 予約可能か
    pub fn is_reservable(&self) -> bool {
        !matches!(self, Rarity::Unique)
    }

    /// 延長可能か（Commonのみ）
    pub fn is_extendable(&self) -> bool {
        matches!(self, Rarity::Common)
    }
}

impl std::str::FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" => Ok(Rarity::Common),
            "rare" => Ok(Rarity::Rare),
            "unique" => Ok(Rarity::Unique),
            _ => Err(format!("Invalid rarity: {}", s)),
        }
    }
}

/// 予約ステータス
///
/// 状態遷移：
/// - Issued --延長--> Extended（延長は1回まで）
/// - Issued/Extended --返却期限超過--> Expired
/// - Issued/Extended/Expired --返却--> Closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    /// 貸出中
    Issued,
    /// 延長済み
    Extended,
    /// 期限切れ
    Expired,
    /// 返却済み
    Closed,
}

impl ReservationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Issued => "issued",
            ReservationState::Extended => "extended",
            ReservationState::Expired => "expired",
            ReservationState::Closed => "closed",
        }
    }

    /// 有効な予約か（Issued または Extended）
    ///
    /// 読者ごとの予約上限のカウント対象。
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationState::Issued | ReservationState::Extended)
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issued" => Ok(ReservationState::Issued),
            "extended" => Ok(ReservationState::Extended),
            "expired" => Ok(ReservationState::Expired),
            "closed" => Ok(ReservationState::Closed),
            _ => Err(format!("Invalid reservation state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_reservation_id_creation() {
        let id1 = ReservationId::new();
        let id2 = ReservationId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_reservation_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = ReservationId::from_uuid(uuid);
        assert_eq!(id.value(), uuid);
    }

    #[test]
    fn test_reader_and_book_id_creation() {
        assert_ne!(ReaderId::new(), ReaderId::new());
        assert_ne!(BookId::new(), BookId::new());
        assert_ne!(LibCardId::new(), LibCardId::new());
    }

    #[test]
    fn test_rarity_rules() {
        assert!(Rarity::Common.is_reservable());
        assert!(Rarity::Rare.is_reservable());
        assert!(!Rarity::Unique.is_reservable());

        assert!(Rarity::Common.is_extendable());
        assert!(!Rarity::Rare.is_extendable());
        assert!(!Rarity::Unique.is_extendable());
    }

    #[test]
    fn test_rarity_from_str_rejects_unknown() {
        assert_eq!(Rarity::from_str("rare"), Ok(Rarity::Rare));
        assert!(Rarity::from_str("legendary").is_err());
    }

    #[test]
    fn test_reservation_state_is_active() {
        assert!(ReservationState::Issued.is_active());
        assert!(ReservationState::Extended.is_active());
        assert!(!ReservationState::Expired.is_active());
        assert!(!ReservationState::Closed.is_active());
    }

    #[test]
    fn test_reservation_state_string_form() {
        for state in [
            ReservationState::Issued,
            ReservationState::Extended,
            ReservationState::Expired,
            ReservationState::Closed,
        ] {
            assert_eq!(ReservationState::from_str(state.as_str()), Ok(state));
        }
        assert!(ReservationState::from_str("overdue").is_err());
    }
}
