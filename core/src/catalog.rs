//! The static catalog of GTFS files loaded by gtfs2db.
//!
//! Files are listed in load order: tables referenced by other tables come
//! first. Booleans are stored as `'t'`/`'f'`, dates as ISO `YYYY-MM-DD` text
//! and times as integer seconds since midnight.

use crate::types::{FieldSpec, FieldType, FileSpec, ObjectName};

use FieldType::{Boolean, Date, Double, Integer, String as Text, Time};

pub const AGENCY: FileSpec = FileSpec {
    name: ObjectName {
        singular: "agency",
        plural: "agencies",
    },
    filename: "agency.txt",
    required: true,
    fields: &[
        FieldSpec::optional("agency_id", Text, 255),
        FieldSpec::required("agency_name", Text, 255),
        FieldSpec::required("agency_url", Text, 255),
        FieldSpec::required("agency_timezone", Text, 64),
        FieldSpec::optional("agency_lang", Text, 2),
        FieldSpec::optional("agency_phone", Text, 255),
        FieldSpec::optional("agency_fare_url", Text, 255),
    ],
    create_table: "CREATE TABLE agencies(\
        id VARCHAR(255) UNIQUE, \
        name VARCHAR(255) NOT NULL, \
        url VARCHAR(255) NOT NULL, \
        timezone VARCHAR(64) NOT NULL, \
        lang CHAR(2), \
        phone VARCHAR(32), \
        fare_url VARCHAR(255))",
    insert: "INSERT INTO agencies(id, name, url, timezone, lang, phone, fare_url) \
        VALUES (?, ?, ?, ?, ?, ?, ?)",
    indexes: &[],
};

pub const CALENDAR: FileSpec = FileSpec {
    name: ObjectName {
        singular: "service schedule",
        plural: "service schedules",
    },
    filename: "calendar.txt",
    required: true,
    fields: &[
        FieldSpec::required("service_id", Text, 255),
        FieldSpec::required("monday", Boolean, 0),
        FieldSpec::required("tuesday", Boolean, 0),
        FieldSpec::required("wednesday", Boolean, 0),
        FieldSpec::required("thursday", Boolean, 0),
        FieldSpec::required("friday", Boolean, 0),
        FieldSpec::required("saturday", Boolean, 0),
        FieldSpec::required("sunday", Boolean, 0),
        FieldSpec::required("start_date", Date, 0),
        FieldSpec::required("end_date", Date, 0),
    ],
    create_table: "CREATE TABLE calendars(\
        service_id VARCHAR(255) PRIMARY KEY, \
        monday BOOLEAN NOT NULL, \
        tuesday BOOLEAN NOT NULL, \
        wednesday BOOLEAN NOT NULL, \
        thursday BOOLEAN NOT NULL, \
        friday BOOLEAN NOT NULL, \
        saturday BOOLEAN NOT NULL, \
        sunday BOOLEAN NOT NULL, \
        start_date DATE NOT NULL, \
        end_date DATE NOT NULL)",
    insert: "INSERT INTO calendars(service_id, monday, tuesday, wednesday, \
        thursday, friday, saturday, sunday, start_date, end_date) \
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    indexes: &[],
};

pub const CALENDAR_DATES: FileSpec = FileSpec {
    name: ObjectName {
        singular: "service exception",
        plural: "service exceptions",
    },
    filename: "calendar_dates.txt",
    required: false,
    fields: &[
        FieldSpec::required("service_id", Text, 255),
        FieldSpec::required("date", Date, 0),
        FieldSpec::required("exception_type", Integer, 0),
    ],
    create_table: "CREATE TABLE calendar_dates(\
        service_id VARCHAR(255), \
        date DATE, \
        exception_type TINYINT NOT NULL, \
        PRIMARY KEY (service_id, date))",
    insert: "INSERT INTO calendar_dates(service_id, date, exception_type) \
        VALUES (?, ?, ?)",
    indexes: &[],
};

pub const ROUTES: FileSpec = FileSpec {
    name: ObjectName {
        singular: "route",
        plural: "routes",
    },
    filename: "routes.txt",
    required: true,
    fields: &[
        FieldSpec::required("route_id", Text, 255),
        FieldSpec::optional("agency_id", Text, 255),
        FieldSpec::required("route_short_name", Text, 255),
        FieldSpec::required("route_long_name", Text, 255),
        FieldSpec::optional("route_desc", Text, 1024),
        FieldSpec::required("route_type", Integer, 0),
        FieldSpec::optional("route_url", Text, 255),
        FieldSpec::optional("route_color", Text, 6),
        FieldSpec::optional("route_text_color", Text, 6),
    ],
    create_table: "CREATE TABLE routes(\
        id VARCHAR(255) PRIMARY KEY, \
        agency_id VARCHAR(255) REFERENCES agencies(id), \
        short_name VARCHAR(255) NOT NULL, \
        long_name VARCHAR(255) NOT NULL, \
        \"desc\" TEXT, \
        route_type TINYINT NOT NULL, \
        url VARCHAR(255), \
        color CHAR(6), \
        text_color CHAR(6))",
    insert: "INSERT INTO routes(id, agency_id, short_name, long_name, \"desc\", \
        route_type, url, color, text_color) \
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    indexes: &[],
};

pub const STOPS: FileSpec = FileSpec {
    name: ObjectName {
        singular: "stop",
        plural: "stops",
    },
    filename: "stops.txt",
    required: true,
    fields: &[
        FieldSpec::required("stop_id", Text, 255),
        FieldSpec::optional("stop_code", Text, 16),
        FieldSpec::required("stop_name", Text, 255),
        FieldSpec::optional("stop_desc", Text, 255),
        FieldSpec::required("stop_lat", Double, 0),
        FieldSpec::required("stop_lon", Double, 0),
        FieldSpec::optional("zone_id", Text, 16),
        FieldSpec::optional("stop_url", Text, 255),
        FieldSpec::optional("location_type", Integer, 0),
        FieldSpec::optional("parent_station", Text, 255),
        FieldSpec::optional("stop_timezone", Text, 64),
        FieldSpec::optional("wheelchair_boarding", Integer, 0),
    ],
    create_table: "CREATE TABLE stops(\
        id VARCHAR(255) PRIMARY KEY, \
        code VARCHAR(16), \
        name VARCHAR(255) NOT NULL, \
        \"desc\" VARCHAR(255), \
        lat DECIMAL(8,6) NOT NULL, \
        lon DECIMAL(9,6) NOT NULL, \
        zone_id VARCHAR(16), \
        url VARCHAR(255), \
        location_type TINYINT, \
        parent_station VARCHAR(255) REFERENCES stops(id), \
        timezone VARCHAR(64), \
        wheelchair_boarding TINYINT)",
    insert: "INSERT INTO stops(id, code, name, \"desc\", lat, lon, zone_id, url, \
        location_type, parent_station, timezone, wheelchair_boarding) \
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    indexes: &["CREATE UNIQUE INDEX stops_code_id_index ON stops(code, id)"],
};

pub const TRIPS: FileSpec = FileSpec {
    name: ObjectName {
        singular: "trip",
        plural: "trips",
    },
    filename: "trips.txt",
    required: true,
    fields: &[
        FieldSpec::required("trip_id", Text, 255),
        FieldSpec::required("route_id", Text, 255),
        FieldSpec::required("service_id", Text, 255),
        FieldSpec::optional("trip_headsign", Text, 255),
        FieldSpec::optional("trip_short_name", Text, 255),
        FieldSpec::optional("direction_id", Integer, 0),
        FieldSpec::optional("block_id", Text, 255),
        FieldSpec::optional("shape_id", Text, 255),
        FieldSpec::optional("wheelchair_accessible", Integer, 0),
        FieldSpec::optional("bikes_allowed", Integer, 0),
    ],
    create_table: "CREATE TABLE trips(\
        id VARCHAR(255) PRIMARY KEY, \
        route_id VARCHAR(255) NOT NULL REFERENCES routes(id), \
        service_id VARCHAR(255) NOT NULL, \
        headsign VARCHAR(255), \
        short_name VARCHAR(255), \
        direction_id TINYINT, \
        block_id VARCHAR(255), \
        shape_id VARCHAR(255), \
        wheelchair_accessible TINYINT, \
        bikes_allowed TINYINT)",
    insert: "INSERT INTO trips(id, route_id, service_id, headsign, short_name, \
        direction_id, block_id, shape_id, wheelchair_accessible, bikes_allowed) \
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    indexes: &[],
};

pub const STOP_TIMES: FileSpec = FileSpec {
    name: ObjectName {
        singular: "stop time",
        plural: "stop times",
    },
    filename: "stop_times.txt",
    required: true,
    fields: &[
        FieldSpec::required("trip_id", Text, 255),
        FieldSpec::required("arrival_time", Time, 0),
        FieldSpec::required("departure_time", Time, 0),
        FieldSpec::required("stop_id", Text, 255),
        FieldSpec::required("stop_sequence", Integer, 0),
        FieldSpec::optional("stop_headsign", Text, 255),
        FieldSpec::optional("pickup_type", Integer, 0),
        FieldSpec::optional("drop_off_type", Integer, 0),
        FieldSpec::optional("shape_dist_traveled", Double, 0),
    ],
    create_table: "CREATE TABLE stop_times(\
        trip_id VARCHAR(255) NOT NULL REFERENCES trips(id), \
        arrival_time INTEGER, \
        departure_time INTEGER, \
        stop_id VARCHAR(255) NOT NULL REFERENCES stops(id), \
        stop_sequence INTEGER NOT NULL, \
        stop_headsign VARCHAR(255), \
        pickup_type TINYINT, \
        drop_off_type TINYINT, \
        shape_dist_traveled DECIMAL)",
    insert: "INSERT INTO stop_times(trip_id, arrival_time, departure_time, stop_id, \
        stop_sequence, stop_headsign, pickup_type, drop_off_type, shape_dist_traveled) \
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    indexes: &["CREATE INDEX stop_times_stop_id_index ON stop_times(stop_id)"],
};

static CATALOG: [FileSpec; 7] = [
    AGENCY,
    CALENDAR,
    CALENDAR_DATES,
    ROUTES,
    STOPS,
    TRIPS,
    STOP_TIMES,
];

/// Returns every file spec in load order.
///
/// # Examples
///
/// ```
/// let files: Vec<_> = gtfs2db_core::catalog().iter().map(|f| f.filename).collect();
/// assert_eq!(files.first(), Some(&"agency.txt"));
/// assert_eq!(files.last(), Some(&"stop_times.txt"));
/// ```
pub fn catalog() -> &'static [FileSpec] {
    &CATALOG
}

/// Looks up the spec for a bundle member, if the catalog declares one.
pub fn find_file_spec(filename: &str) -> Option<&'static FileSpec> {
    CATALOG.iter().find(|spec| spec.filename == filename)
}

/// Returns the spec for a file the catalog is known to declare.
///
/// # Panics
///
/// Panics if `filename` is not declared; callers pass names taken from the
/// catalog itself.
pub fn file_spec(filename: &str) -> &'static FileSpec {
    find_file_spec(filename)
        .unwrap_or_else(|| panic!("{filename} is not declared in the GTFS catalog"))
}
