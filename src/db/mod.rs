pub mod memory;
pub mod pool;
pub mod postgres;
pub mod queries;
pub mod repository;

pub use memory::MemoryRepository;
pub use pool::create_pool;
pub use postgres::PgDivisionRepository;
pub use repository::DivisionRepository;
