use serde::Serialize;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

macro_rules! permission_mask {
    ($(#[$meta:meta])* $name:ident { $($bit:ident = $value:expr, $label:expr;)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const NONE: $name = $name(0);
            $(pub const $bit: $name = $name($value);)+

            pub fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Names of the individual bits set in this mask.
            pub fn names(self) -> Vec<&'static str> {
                let mut out = Vec::new();
                $(if self.contains($name::$bit) { out.push($label); })+
                out
            }
        }

        impl BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.names().join("|"))
            }
        }
    };
}

permission_mask! {
    /// Global permission mask, independent of any event.
    GlobalPermissions {
        LIST_EVENTS = 1 << 0, "ListEvents";
        READ_INCIDENT_TYPES = 1 << 1, "ReadIncidentTypes";
        READ_STREETS = 1 << 2, "ReadStreets";
        READ_PERSONNEL = 1 << 3, "ReadPersonnel";
        ADMINISTRATE_EVENTS = 1 << 4, "AdministrateEvents";
        ADMINISTRATE_STREETS = 1 << 5, "AdministrateStreets";
        ADMINISTRATE_INCIDENT_TYPES = 1 << 6, "AdministrateIncidentTypes";
        ADMINISTRATE_DEBUGGING = 1 << 7, "AdministrateDebugging";
        ADMINISTRATE_DESTINATIONS = 1 << 8, "AdministrateDestinations";
        READ_EVENT_NAME = 1 << 9, "ReadEventName";
    }
}

permission_mask! {
    /// Per-event permission mask.
    EventPermissions {
        READ_INCIDENTS = 1 << 0, "ReadIncidents";
        WRITE_INCIDENTS = 1 << 1, "WriteIncidents";
        READ_ALL_FIELD_REPORTS = 1 << 2, "ReadAllFieldReports";
        READ_OWN_FIELD_REPORTS = 1 << 3, "ReadOwnFieldReports";
        WRITE_ALL_FIELD_REPORTS = 1 << 4, "WriteAllFieldReports";
        WRITE_OWN_FIELD_REPORTS = 1 << 5, "WriteOwnFieldReports";
        READ_EVENT_NAME = 1 << 6, "ReadEventName";
        READ_DESTINATIONS = 1 << 7, "ReadDestinations";
        READ_STAYS = 1 << 8, "ReadStays";
        WRITE_STAYS = 1 << 9, "WriteStays";
    }
}

impl GlobalPermissions {
    /// Granted to any request carrying a valid token with a handle.
    pub const ANY_AUTHENTICATED: GlobalPermissions = GlobalPermissions(
        GlobalPermissions::LIST_EVENTS.0
            | GlobalPermissions::READ_INCIDENT_TYPES.0
            | GlobalPermissions::READ_PERSONNEL.0
            | GlobalPermissions::READ_STREETS.0,
    );

    /// Granted to handles on the configured administrators list.
    pub const ADMINISTRATOR: GlobalPermissions = GlobalPermissions(
        GlobalPermissions::ANY_AUTHENTICATED.0
            | GlobalPermissions::ADMINISTRATE_EVENTS.0
            | GlobalPermissions::ADMINISTRATE_STREETS.0
            | GlobalPermissions::ADMINISTRATE_INCIDENT_TYPES.0
            | GlobalPermissions::ADMINISTRATE_DEBUGGING.0
            | GlobalPermissions::ADMINISTRATE_DESTINATIONS.0
            | GlobalPermissions::READ_EVENT_NAME.0,
    );
}

impl EventPermissions {
    /// Bundle for `read` rules.
    pub const READER: EventPermissions = EventPermissions(
        EventPermissions::READ_EVENT_NAME.0
            | EventPermissions::READ_INCIDENTS.0
            | EventPermissions::READ_ALL_FIELD_REPORTS.0
            | EventPermissions::READ_OWN_FIELD_REPORTS.0
            | EventPermissions::READ_DESTINATIONS.0
            | EventPermissions::READ_STAYS.0,
    );

    /// Bundle for `write` rules: everything a reader has, plus writes.
    pub const WRITER: EventPermissions = EventPermissions(
        EventPermissions::READER.0
            | EventPermissions::WRITE_INCIDENTS.0
            | EventPermissions::WRITE_ALL_FIELD_REPORTS.0
            | EventPermissions::WRITE_OWN_FIELD_REPORTS.0,
    );

    /// Bundle for `report` rules: own field reports only.
    pub const REPORTER: EventPermissions = EventPermissions(
        EventPermissions::READ_EVENT_NAME.0
            | EventPermissions::READ_OWN_FIELD_REPORTS.0
            | EventPermissions::WRITE_OWN_FIELD_REPORTS.0
            | EventPermissions::READ_DESTINATIONS.0,
    );
}
