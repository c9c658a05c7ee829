pub mod in_memory;
pub mod supabase;

pub use in_memory::InMemoryCalendar;
pub use supabase::SupabaseSchedulingStore;
