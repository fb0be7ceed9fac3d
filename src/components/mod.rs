pub mod transaction_map;
