//! Maps a parsed diagram record onto the node/edge description consumed by
//! the layout engine. All referential invariants are enforced here so a bad
//! model response fails before anything is drawn.

use crate::error::Error;
use crate::ir::{Edge, EdgeStyle, Graph, NodeShape};
use crate::schema::{
    ActivityDiagram, ClassDiagram, Diagram, SequenceDiagram, UseCaseDiagram, FINAL_ID, START_ID,
};

pub fn build_graph(diagram: &Diagram) -> Result<Graph, Error> {
    match diagram {
        Diagram::Activity(d) => activity_graph(d),
        Diagram::Sequence(d) => sequence_graph(d),
        Diagram::Class(d) => class_graph(d),
        Diagram::UseCase(d) => use_case_graph(d),
    }
}

/// Start node, final node, one node per activity (diamond when the label
/// contains `?`), the declared edges, and one implicit edge from the last
/// declared edge's target to the final node.
fn activity_graph(diagram: &ActivityDiagram) -> Result<Graph, Error> {
    let mut graph = Graph::new(crate::ir::Direction::TopDown);
    graph.add_node(START_ID, "", NodeShape::Circle);
    graph.add_node(FINAL_ID, "", NodeShape::DoubleCircle);

    for activity in &diagram.activities {
        let shape = if activity.label.contains('?') {
            NodeShape::Diamond
        } else {
            NodeShape::RoundRect
        };
        graph.add_node(&activity.id, &activity.label, shape);
    }

    let last = diagram
        .edges
        .last()
        .ok_or_else(|| Error::Render("activity diagram has no edges".to_string()))?
        .clone();

    for edge in &diagram.edges {
        for endpoint in [&edge.from, &edge.to] {
            if !graph.has_node(endpoint) {
                return Err(Error::Render(format!(
                    "edge references unknown activity id `{endpoint}`"
                )));
            }
        }
        graph
            .edges
            .push(Edge::arrow(&edge.from, &edge.to, edge.label.clone()));
    }

    // Implicit terminal hookup: the target of the last declared edge flows
    // into the final node, even when that target is `final` itself.
    graph.edges.push(Edge::arrow(&last.to, FINAL_ID, None));

    Ok(graph)
}

/// Participants as boxes in declaration order, one invisible ordering edge
/// between each consecutive pair, one labeled arrow per message. Duplicate
/// from/to pairs are legal and yield parallel edges.
fn sequence_graph(diagram: &SequenceDiagram) -> Result<Graph, Error> {
    let mut graph = Graph::new(crate::ir::Direction::LeftRight);

    for participant in &diagram.participants {
        graph.add_node(participant, participant, NodeShape::Box);
    }
    for pair in diagram.participants.windows(2) {
        graph.edges.push(Edge {
            from: pair[0].clone(),
            to: pair[1].clone(),
            label: None,
            directed: true,
            style: EdgeStyle::Invisible,
        });
    }

    for msg in &diagram.messages {
        for endpoint in [&msg.from, &msg.to] {
            if !graph.has_node(endpoint) {
                return Err(Error::Render(format!(
                    "message references unknown participant `{endpoint}`"
                )));
            }
        }
        graph
            .edges
            .push(Edge::arrow(&msg.from, &msg.to, Some(msg.message.clone())));
    }

    Ok(graph)
}

/// One record node per class with name/attribute/method compartments (empty
/// compartments allowed), one labeled arrow per relationship.
fn class_graph(diagram: &ClassDiagram) -> Result<Graph, Error> {
    let mut graph = Graph::new(crate::ir::Direction::TopDown);

    for class in &diagram.classes {
        graph.add_record_node(
            &class.name,
            vec![
                vec![class.name.clone()],
                class.attributes.clone(),
                class.methods.clone(),
            ],
        );
    }

    for rel in &diagram.relationships {
        for endpoint in [&rel.from, &rel.to] {
            if !graph.has_node(endpoint) {
                return Err(Error::Render(format!(
                    "relationship references unknown class `{endpoint}`"
                )));
            }
        }
        graph
            .edges
            .push(Edge::arrow(&rel.from, &rel.to, Some(rel.kind.clone())));
    }

    Ok(graph)
}

/// Actors as boxes, use cases as ellipses, a plain association edge per
/// (actor, use case) pair, and dashed labeled arrows for relationships.
fn use_case_graph(diagram: &UseCaseDiagram) -> Result<Graph, Error> {
    let mut graph = Graph::new(crate::ir::Direction::LeftRight);

    for actor in &diagram.actors {
        graph.add_node(actor, actor, NodeShape::Box);
    }
    for use_case in &diagram.use_cases {
        graph.add_node(&use_case.name, &use_case.name, NodeShape::Ellipse);
    }

    for use_case in &diagram.use_cases {
        for actor in &use_case.actors {
            if !graph.has_node(actor) {
                return Err(Error::Render(format!(
                    "use case `{}` references unknown actor `{actor}`",
                    use_case.name
                )));
            }
            graph.edges.push(Edge {
                from: actor.clone(),
                to: use_case.name.clone(),
                label: None,
                directed: false,
                style: EdgeStyle::Solid,
            });
        }
    }

    for rel in &diagram.relationships {
        for endpoint in [&rel.from, &rel.to] {
            if !graph.has_node(endpoint) {
                return Err(Error::Render(format!(
                    "relationship references unknown name `{endpoint}`"
                )));
            }
        }
        graph.edges.push(Edge {
            from: rel.from.clone(),
            to: rel.to.clone(),
            label: Some(rel.kind.clone()),
            directed: true,
            style: EdgeStyle::Dashed,
        });
    }

    Ok(graph)
}
