use serde_json::json;

use super::{BroadcastEvent, Channel};
use crate::entities::{Concern, ConcernAction};
use crate::value_objects::Timestamp;

/// 诉求变更：公共 `concerns` 频道加上所属院系的私有频道
#[derive(Debug, Clone)]
pub struct ConcernUpdated {
    pub concern: Concern,
    pub action: ConcernAction,
    pub timestamp: Timestamp,
}

impl ConcernUpdated {
    pub fn new(concern: Concern, action: ConcernAction, timestamp: Timestamp) -> Self {
        Self {
            concern,
            action,
            timestamp,
        }
    }
}

impl BroadcastEvent for ConcernUpdated {
    fn broadcast_on(&self) -> Vec<Channel> {
        vec![
            Channel::Concerns,
            Channel::Department(self.concern.department_id),
        ]
    }

    fn broadcast_as(&self) -> &'static str {
        "concern.updated"
    }

    fn broadcast_with(&self) -> serde_json::Value {
        let concern = &self.concern;
        json!({
            "concern": {
                "id": concern.id,
                "reference_number": concern.reference_number,
                "subject": concern.subject,
                "status": concern.status,
                "priority": concern.priority,
                "type": concern.concern_type,
                "department_id": concern.department_id,
                "student_id": concern.student_id,
                "assigned_to": concern.assigned_to,
                "escalation_level": concern.escalation_level,
                "updated_at": concern.updated_at,
            },
            "action": self.action,
            "timestamp": self.timestamp,
        })
    }
}
