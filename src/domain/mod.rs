pub mod codec;
pub mod event;
pub mod ledger;
pub mod payee;
pub mod ports;
