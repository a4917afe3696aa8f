pub mod db;
mod schemas;
