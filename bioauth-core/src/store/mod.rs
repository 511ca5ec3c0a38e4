pub mod template_store;
