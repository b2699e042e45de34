pub mod fiche;
pub mod phone;

pub use fiche::{Fiche, FicheFields};
pub use phone::{normalize_fr_phone, PhoneKey, PHONE_KEY_LEN};
