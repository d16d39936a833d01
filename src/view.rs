pub mod binder;
pub mod session;
