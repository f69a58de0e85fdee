pub mod hotel_db;
