mod as_of;

pub use as_of::resolve_as_of_date;
