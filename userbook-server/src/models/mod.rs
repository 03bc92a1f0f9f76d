//! Domain models shared by the storage and HTTP layers
//!
//! Text fields are opaque: the service checks presence only and leaves
//! type enforcement (e.g. `birthdate` as a calendar date) to the store.

pub mod pagination;
pub mod user;

pub use pagination::{Paginated, Pagination, PAGE_SIZE};
pub use user::{AddressInput, NewUser, UserId, UserRow, UserUpdate};
