pub mod order;
pub mod order_book;
