pub mod gemini_service;
pub mod trip_generation_service;
pub mod trip_service;
pub mod unsplash_service;
