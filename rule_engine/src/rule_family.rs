// Closed enumeration of rule families and the layers that own them.
//
// A RuleFamily is a (Layer, family-name) pair; the RuleTable is partitioned
// by family so that hot-path queries for one family never scan another's
// entries, and so bundle loads can publish a family's contents atomically
// without perturbing sibling families.

use serde::{Deserialize, Serialize};

/// Evaluation layers, total-ordered L0 (closest to the host) through L6
/// (closest to the network boundary). The evaluation engine walks layers
/// in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    L0System,
    L1Input,
    L2Planner,
    L3ModelIO,
    L4ToolGateway,
    L5RAG,
    L6Egress,
}

impl Layer {
    pub fn all() -> [Layer; 7] {
        [
            Layer::L0System,
            Layer::L1Input,
            Layer::L2Planner,
            Layer::L3ModelIO,
            Layer::L4ToolGateway,
            Layer::L5RAG,
            Layer::L6Egress,
        ]
    }

    pub fn ordinal(&self) -> u8 {
        match self {
            Layer::L0System => 0,
            Layer::L1Input => 1,
            Layer::L2Planner => 2,
            Layer::L3ModelIO => 3,
            Layer::L4ToolGateway => 4,
            Layer::L5RAG => 5,
            Layer::L6Egress => 6,
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Layer::L0System => "L0_System",
            Layer::L1Input => "L1_Input",
            Layer::L2Planner => "L2_Planner",
            Layer::L3ModelIO => "L3_ModelIO",
            Layer::L4ToolGateway => "L4_ToolGateway",
            Layer::L5RAG => "L5_RAG",
            Layer::L6Egress => "L6_Egress",
        };
        write!(f, "{name}")
    }
}

/// The secondary index a family's FamilyTable keys rules on, beyond the
/// always-present agent/global indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryIndexKind {
    Domain,
    Image,
    Tool,
    Source,
    None,
}

/// Closed enumeration of the 14 rule families across L0-L6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleFamily {
    NetworkEgress,
    SidecarSpawn,
    InputSchema,
    InputSanitize,
    PromptAssembly,
    PromptLength,
    ModelOutputScan,
    ModelOutputEscalate,
    ToolWhitelist,
    ToolParamConstraint,
    RAGSource,
    RAGDocSensitivity,
    OutputPII,
    OutputAudit,
}

impl RuleFamily {
    pub fn all() -> [RuleFamily; 14] {
        [
            RuleFamily::NetworkEgress,
            RuleFamily::SidecarSpawn,
            RuleFamily::InputSchema,
            RuleFamily::InputSanitize,
            RuleFamily::PromptAssembly,
            RuleFamily::PromptLength,
            RuleFamily::ModelOutputScan,
            RuleFamily::ModelOutputEscalate,
            RuleFamily::ToolWhitelist,
            RuleFamily::ToolParamConstraint,
            RuleFamily::RAGSource,
            RuleFamily::RAGDocSensitivity,
            RuleFamily::OutputPII,
            RuleFamily::OutputAudit,
        ]
    }

    pub fn layer(&self) -> Layer {
        match self {
            RuleFamily::NetworkEgress | RuleFamily::SidecarSpawn => Layer::L0System,
            RuleFamily::InputSchema | RuleFamily::InputSanitize => Layer::L1Input,
            RuleFamily::PromptAssembly | RuleFamily::PromptLength => Layer::L2Planner,
            RuleFamily::ModelOutputScan | RuleFamily::ModelOutputEscalate => Layer::L3ModelIO,
            RuleFamily::ToolWhitelist | RuleFamily::ToolParamConstraint => Layer::L4ToolGateway,
            RuleFamily::RAGSource | RuleFamily::RAGDocSensitivity => Layer::L5RAG,
            RuleFamily::OutputPII | RuleFamily::OutputAudit => Layer::L6Egress,
        }
    }

    /// Stable lowercase identifier, used in bundle JSON and telemetry.
    pub fn family_id(&self) -> &'static str {
        match self {
            RuleFamily::NetworkEgress => "net_egress",
            RuleFamily::SidecarSpawn => "sidecar_spawn",
            RuleFamily::InputSchema => "input_schema",
            RuleFamily::InputSanitize => "input_sanitize",
            RuleFamily::PromptAssembly => "prompt_assembly",
            RuleFamily::PromptLength => "prompt_length",
            RuleFamily::ModelOutputScan => "model_output_scan",
            RuleFamily::ModelOutputEscalate => "model_output_escalate",
            RuleFamily::ToolWhitelist => "tool_whitelist",
            RuleFamily::ToolParamConstraint => "tool_param_constraint",
            RuleFamily::RAGSource => "rag_source",
            RuleFamily::RAGDocSensitivity => "rag_doc_sensitivity",
            RuleFamily::OutputPII => "output_pii",
            RuleFamily::OutputAudit => "output_audit",
        }
    }

    pub fn secondary_index_kind(&self) -> SecondaryIndexKind {
        match self {
            RuleFamily::NetworkEgress => SecondaryIndexKind::Domain,
            RuleFamily::SidecarSpawn => SecondaryIndexKind::Image,
            RuleFamily::ToolWhitelist | RuleFamily::ToolParamConstraint => SecondaryIndexKind::Tool,
            RuleFamily::RAGSource | RuleFamily::RAGDocSensitivity => SecondaryIndexKind::Source,
            _ => SecondaryIndexKind::None,
        }
    }

    pub fn from_family_id(id: &str) -> Option<RuleFamily> {
        RuleFamily::all().into_iter().find(|f| f.family_id() == id)
    }
}

impl std::fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.family_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_all_is_ordered_l0_through_l6() {
        let layers = Layer::all();
        for window in layers.windows(2) {
            assert!(window[0].ordinal() < window[1].ordinal());
        }
    }

    #[test]
    fn every_family_round_trips_through_family_id() {
        for family in RuleFamily::all() {
            assert_eq!(RuleFamily::from_family_id(family.family_id()), Some(family));
        }
    }

    #[test]
    fn from_family_id_rejects_unknown_id() {
        assert_eq!(RuleFamily::from_family_id("not_a_real_family"), None);
    }

    #[test]
    fn family_layer_assignment_matches_documented_grouping() {
        assert_eq!(RuleFamily::NetworkEgress.layer(), Layer::L0System);
        assert_eq!(RuleFamily::InputSanitize.layer(), Layer::L1Input);
        assert_eq!(RuleFamily::PromptLength.layer(), Layer::L2Planner);
        assert_eq!(RuleFamily::ModelOutputEscalate.layer(), Layer::L3ModelIO);
        assert_eq!(RuleFamily::ToolParamConstraint.layer(), Layer::L4ToolGateway);
        assert_eq!(RuleFamily::RAGDocSensitivity.layer(), Layer::L5RAG);
        assert_eq!(RuleFamily::OutputAudit.layer(), Layer::L6Egress);
    }

    #[test]
    fn secondary_index_kind_matches_families_that_need_one() {
        assert_eq!(RuleFamily::NetworkEgress.secondary_index_kind(), SecondaryIndexKind::Domain);
        assert_eq!(RuleFamily::ToolWhitelist.secondary_index_kind(), SecondaryIndexKind::Tool);
        assert_eq!(RuleFamily::RAGSource.secondary_index_kind(), SecondaryIndexKind::Source);
        assert_eq!(RuleFamily::InputSchema.secondary_index_kind(), SecondaryIndexKind::None);
    }

    #[test]
    fn display_matches_family_id() {
        assert_eq!(RuleFamily::OutputPII.to_string(), "output_pii");
    }
}
