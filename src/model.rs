pub mod db_model;
pub mod timescar_api_model;
