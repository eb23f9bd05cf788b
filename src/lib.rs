pub mod config;

pub mod shared {
    pub mod core {
        pub mod date_range;
        pub mod event_context;
        pub mod interval;
        pub mod time;
    }
    pub mod infrastructure {
        pub mod document_store;
        pub mod query_builder;
        pub mod repository;
    }
}

pub mod modules {
    pub mod time_entries {
        pub mod core {
            pub mod ports;
            pub mod time_entry;
            pub mod worked_time;
        }
        pub mod adapters {
            pub mod outbound {
                pub mod related_entities;
                pub mod time_entry_query_builder;
                pub mod time_entry_repository;
                pub mod time_entry_validator;
            }
        }
    }
}
