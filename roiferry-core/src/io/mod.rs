mod table;

pub use table::ImagePair;
pub use table::read_image_pairs;
pub use table::read_table;
pub use table::read_table_csv;
pub use table::read_table_pq;
