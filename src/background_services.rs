pub mod station_harvester;
