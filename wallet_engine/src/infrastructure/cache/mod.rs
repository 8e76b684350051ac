pub mod transaction_list_cache;
