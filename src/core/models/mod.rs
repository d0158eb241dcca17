pub mod group;
pub mod member;
pub mod transaction;
pub mod user;

pub use group::{ContributionFrequency, GroupWithStats, SavingsGroup, INVITE_CODE_LEN};
pub use member::{GroupMember, MemberRole, MemberWithUser};
pub use transaction::{Transaction, TransactionType, TransactionWithUser};
pub use user::{User, UserInfo, UserRole};
