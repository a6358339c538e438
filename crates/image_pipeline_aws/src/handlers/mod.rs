pub mod image_event;
