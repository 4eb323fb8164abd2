//! The fixed catalogue of extension points and the service areas owning them

use serde::{Deserialize, Serialize};
use vtn_core::MessageType;

use crate::error::RegistryError;

/// URL prefix shared by every service endpoint
pub const SERVICE_PREFIX: &str = "/OpenADR2/Simple/2.0b";

/// Named extension points an operator can bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerName {
    /// A VEN acknowledges an event (`oadrCreatedEvent`)
    OnCreatedEvent,
    /// A VEN asks for its events (`oadrRequestEvent`)
    OnRequestEvent,
    /// A VEN announces the reports it can provide (`oadrRegisterReport`)
    OnRegisterReport,
    /// A VEN asks the VTN to send reports (`oadrCreateReport`)
    OnCreateReport,
    /// A VEN acknowledges a report request (`oadrCreatedReport`)
    OnCreatedReport,
    OnRequestReport,
    /// Report data arrives (`oadrUpdateReport`)
    OnUpdateReport,
    /// A VEN polls for pending messages
    OnPoll,
    /// A VEN asks for the VTN's registration details (`oadrQueryRegistration`)
    OnQueryRegistration,
    /// A VEN asks to register
    OnCreatePartyRegistration,
    /// A VEN ends its registration (`oadrCancelPartyRegistration`)
    OnCancelPartyRegistration,
}

impl HandlerName {
    /// Every extension point, in catalogue order
    pub const ALL: [HandlerName; 11] = [
        HandlerName::OnCreatedEvent,
        HandlerName::OnRequestEvent,
        HandlerName::OnRegisterReport,
        HandlerName::OnCreateReport,
        HandlerName::OnCreatedReport,
        HandlerName::OnRequestReport,
        HandlerName::OnUpdateReport,
        HandlerName::OnPoll,
        HandlerName::OnQueryRegistration,
        HandlerName::OnCreatePartyRegistration,
        HandlerName::OnCancelPartyRegistration,
    ];

    /// The snake_case name used in configuration and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerName::OnCreatedEvent => "on_created_event",
            HandlerName::OnRequestEvent => "on_request_event",
            HandlerName::OnRegisterReport => "on_register_report",
            HandlerName::OnCreateReport => "on_create_report",
            HandlerName::OnCreatedReport => "on_created_report",
            HandlerName::OnRequestReport => "on_request_report",
            HandlerName::OnUpdateReport => "on_update_report",
            HandlerName::OnPoll => "on_poll",
            HandlerName::OnQueryRegistration => "on_query_registration",
            HandlerName::OnCreatePartyRegistration => "on_create_party_registration",
            HandlerName::OnCancelPartyRegistration => "on_cancel_party_registration",
        }
    }

    /// All legal names as strings
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(HandlerName::as_str).collect()
    }

    /// The service area that owns this extension point
    pub fn area(&self) -> ServiceArea {
        match self {
            HandlerName::OnCreatedEvent | HandlerName::OnRequestEvent => ServiceArea::Event,
            HandlerName::OnRegisterReport
            | HandlerName::OnCreateReport
            | HandlerName::OnCreatedReport
            | HandlerName::OnRequestReport
            | HandlerName::OnUpdateReport => ServiceArea::Report,
            HandlerName::OnPoll => ServiceArea::Poll,
            HandlerName::OnQueryRegistration
            | HandlerName::OnCreatePartyRegistration
            | HandlerName::OnCancelPartyRegistration => ServiceArea::Registration,
        }
    }

    /// The inbound message type this extension point answers
    pub fn message_type(&self) -> MessageType {
        match self {
            HandlerName::OnCreatedEvent => MessageType::CreatedEvent,
            HandlerName::OnRequestEvent => MessageType::RequestEvent,
            HandlerName::OnRegisterReport => MessageType::RegisterReport,
            HandlerName::OnCreateReport => MessageType::CreateReport,
            HandlerName::OnCreatedReport => MessageType::CreatedReport,
            HandlerName::OnRequestReport => MessageType::RequestReport,
            HandlerName::OnUpdateReport => MessageType::UpdateReport,
            HandlerName::OnPoll => MessageType::Poll,
            HandlerName::OnQueryRegistration => MessageType::QueryRegistration,
            HandlerName::OnCreatePartyRegistration => MessageType::CreatePartyRegistration,
            HandlerName::OnCancelPartyRegistration => MessageType::CancelPartyRegistration,
        }
    }

    /// The extension point answering `message_type`, if there is one
    pub fn for_message(message_type: MessageType) -> Option<HandlerName> {
        Self::ALL
            .into_iter()
            .find(|name| name.message_type() == message_type)
    }
}

impl std::fmt::Display for HandlerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HandlerName {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownHandler {
                name: s.to_string(),
                valid: Self::names(),
            })
    }
}

/// A group of message types served by one transport endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceArea {
    /// `EiEvent`
    Event,
    /// `EiReport`
    Report,
    Poll,
    Opt,
    /// `EiRegisterParty`
    Registration,
}

impl ServiceArea {
    /// Every area, one endpoint each
    pub const ALL: [ServiceArea; 5] = [
        ServiceArea::Event,
        ServiceArea::Report,
        ServiceArea::Poll,
        ServiceArea::Opt,
        ServiceArea::Registration,
    ];

    /// Last segment of the endpoint path
    pub fn path_segment(&self) -> &'static str {
        match self {
            ServiceArea::Event => "EiEvent",
            ServiceArea::Report => "EiReport",
            ServiceArea::Poll => "OadrPoll",
            ServiceArea::Opt => "EiOpt",
            ServiceArea::Registration => "EiRegisterParty",
        }
    }

    /// Full endpoint path, e.g. `/OpenADR2/Simple/2.0b/EiEvent`
    pub fn path(&self) -> String {
        format!("{}/{}", SERVICE_PREFIX, self.path_segment())
    }

    /// Extension points this area dispatches to
    pub fn extension_points(&self) -> Vec<HandlerName> {
        HandlerName::ALL
            .into_iter()
            .filter(|name| name.area() == *self)
            .collect()
    }

    /// The area whose endpoint accepts `message_type`
    ///
    /// Outbound-only types such as `oadrResponse` belong to no area.
    pub fn for_message(message_type: MessageType) -> Option<ServiceArea> {
        use MessageType::*;

        match message_type {
            RequestEvent | CreatedEvent => Some(ServiceArea::Event),
            RegisterReport | CreateReport | CreatedReport | RequestReport | UpdateReport
            | RegisteredReport | CancelReport | CanceledReport | UpdatedReport => {
                Some(ServiceArea::Report)
            }
            Poll => Some(ServiceArea::Poll),
            CreateOpt | CancelOpt | CreatedOpt | CanceledOpt => Some(ServiceArea::Opt),
            QueryRegistration
            | CreatePartyRegistration
            | CancelPartyRegistration
            | CanceledPartyRegistration => Some(ServiceArea::Registration),
            DistributeEvent | CreatedPartyRegistration | Response => None,
        }
    }
}

impl std::fmt::Display for ServiceArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = HandlerName::names().into_iter().collect();
        assert_eq!(names.len(), HandlerName::ALL.len());
    }

    #[test]
    fn test_name_parsing() {
        for name in HandlerName::ALL {
            assert_eq!(name.as_str().parse::<HandlerName>().unwrap(), name);
        }

        let err = "on_created_opt".parse::<HandlerName>().unwrap_err();
        match err {
            RegistryError::UnknownHandler { name, valid } => {
                assert_eq!(name, "on_created_opt");
                assert_eq!(valid.len(), 11);
                assert!(valid.contains(&"on_poll"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_extension_points_agree_with_message_areas() {
        for name in HandlerName::ALL {
            assert_eq!(ServiceArea::for_message(name.message_type()), Some(name.area()));
            assert_eq!(HandlerName::for_message(name.message_type()), Some(name));
        }
    }

    #[test]
    fn test_area_membership() {
        assert_eq!(ServiceArea::Event.extension_points().len(), 2);
        assert_eq!(ServiceArea::Report.extension_points().len(), 5);
        assert_eq!(ServiceArea::Poll.extension_points(), vec![HandlerName::OnPoll]);
        assert!(ServiceArea::Opt.extension_points().is_empty());
        assert_eq!(ServiceArea::Registration.extension_points().len(), 3);
    }

    #[test]
    fn test_paths() {
        assert_eq!(ServiceArea::Event.path(), "/OpenADR2/Simple/2.0b/EiEvent");
        assert_eq!(
            ServiceArea::Registration.path(),
            "/OpenADR2/Simple/2.0b/EiRegisterParty"
        );
    }

    #[test]
    fn test_opt_messages_have_no_extension_point() {
        assert_eq!(ServiceArea::for_message(MessageType::CreateOpt), Some(ServiceArea::Opt));
        assert_eq!(HandlerName::for_message(MessageType::CreateOpt), None);
        assert_eq!(ServiceArea::for_message(MessageType::Response), None);
    }
}
