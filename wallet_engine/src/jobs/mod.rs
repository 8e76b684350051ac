pub mod expiry_worker;
