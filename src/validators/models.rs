//! Content model compilation and matching
//!
//! A content model is compiled once into a deterministic position
//! (Glushkov) automaton: every element or wildcard occurrence becomes a
//! position, sequence is concatenation, choice is alternation, bounded
//! occurrences are unrolled into mandatory copies followed by nested optional
//! copies, and unbounded occurrences close a loop over a single copy. The
//! automaton state after reading a child is the position that consumed it.
//!
//! Determinism (Unique Particle Attribution) is checked while building the
//! transition table: two positions reachable from the same state may not
//! accept the same tag.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#cos-nonambig

use std::collections::{BTreeSet, VecDeque};

use indexmap::IndexMap;

use crate::limits::Limits;
use crate::namespaces::QName;

use super::complex_types::TypeRef;
use super::exceptions::{ExpectedParticle, SchemaError};
use super::groups::ModelType;
use super::particles::Particle;

/// Which kind of particle consumed a child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedParticle {
    /// An element particle of the content model
    Element,
    /// A slot of an extension point
    Extension,
}

/// The particle a child was attributed to and the type it must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    /// Type to validate the child against
    pub type_ref: TypeRef,
    /// Element particle or extension slot
    pub via: MatchedParticle,
}

/// Why a child sequence was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionKind {
    /// No particle at the current point accepts the tag
    UnexpectedChild {
        /// The rejected tag
        tag: QName,
        /// True if the current point offered a resolved extension point
        in_wildcard: bool,
    },
    /// The sequence ended before the model was complete
    MissingRequiredChild(ExpectedParticle),
}

/// A failed match: the first child index that could not be consumed, or the
/// child count when the sequence ended early
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Zero-based child index
    pub position: usize,
    /// What went wrong
    pub kind: RejectionKind,
}

#[derive(Debug, Clone)]
enum Symbol {
    Element { name: QName, type_ref: TypeRef },
    Wildcard { slots: IndexMap<QName, TypeRef> },
}

impl Symbol {
    fn expected(&self) -> ExpectedParticle {
        match self {
            Symbol::Element { name, .. } => ExpectedParticle::Element(name.clone()),
            Symbol::Wildcard { .. } => ExpectedParticle::Extension,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    position: usize,
    attribution: Attribution,
}

#[derive(Debug, Clone, Default)]
struct State {
    accepting: bool,
    candidates: Vec<usize>,
    transitions: IndexMap<QName, Transition>,
    offers_extension: bool,
    // First position on a shortest completion; None for accepting states.
    completion: Option<usize>,
}

/// Regular expression over positions, before analysis
#[derive(Debug)]
enum Term {
    Empty,
    Leaf(usize),
    Concat(Vec<Term>),
    Alt(Vec<Term>),
    Plus(Box<Term>),
    Opt(Box<Term>),
}

struct Facts {
    nullable: bool,
    first: BTreeSet<usize>,
    last: BTreeSet<usize>,
}

struct TermBuilder<'a> {
    type_name: &'a QName,
    limit: usize,
    symbols: Vec<Symbol>,
}

impl<'a> TermBuilder<'a> {
    fn term(&mut self, particle: &Particle) -> Result<Term, SchemaError> {
        let occurs = particle.occurs();
        if !occurs.is_consistent() {
            return Err(SchemaError::InvalidOccurs {
                type_name: self.type_name.clone(),
                occurs,
            });
        }
        if occurs.max == Some(0) {
            return Ok(Term::Empty);
        }
        if !has_leaves(particle) {
            // An empty choice admits no child sequence at all.
            return Ok(if particle.is_emptiable() {
                Term::Empty
            } else {
                Term::Alt(Vec::new())
            });
        }

        let mut items = Vec::new();
        match occurs.max {
            None => {
                for _ in 1..occurs.min {
                    items.push(self.once(particle)?);
                }
                let repeated = Term::Plus(Box::new(self.once(particle)?));
                items.push(if occurs.min == 0 {
                    Term::Opt(Box::new(repeated))
                } else {
                    repeated
                });
            }
            Some(max) => {
                for _ in 0..occurs.min {
                    items.push(self.once(particle)?);
                }
                let mut optional = Vec::new();
                for _ in occurs.min..max {
                    optional.push(self.once(particle)?);
                }
                // x{0,3} becomes (x (x (x)?)?)? so each copy is attributable.
                let mut tail: Option<Term> = None;
                for copy in optional.into_iter().rev() {
                    let body = match tail {
                        None => copy,
                        Some(rest) => Term::Concat(vec![copy, rest]),
                    };
                    tail = Some(Term::Opt(Box::new(body)));
                }
                items.extend(tail);
            }
        }

        Ok(if items.len() == 1 {
            items.pop().unwrap_or(Term::Empty)
        } else {
            Term::Concat(items)
        })
    }

    fn once(&mut self, particle: &Particle) -> Result<Term, SchemaError> {
        match particle {
            Particle::Element(e) => self.leaf(Symbol::Element {
                name: e.name.clone(),
                type_ref: e.type_ref,
            }),
            Particle::Wildcard(w) => self.leaf(Symbol::Wildcard {
                slots: w.slots.clone(),
            }),
            Particle::Group(g) => {
                let mut terms = Vec::with_capacity(g.particles.len());
                for p in &g.particles {
                    terms.push(self.term(p)?);
                }
                Ok(match g.model {
                    ModelType::Sequence => Term::Concat(terms),
                    ModelType::Choice => Term::Alt(terms),
                })
            }
        }
    }

    fn leaf(&mut self, symbol: Symbol) -> Result<Term, SchemaError> {
        if self.symbols.len() >= self.limit {
            return Err(SchemaError::ContentModelTooLarge {
                type_name: self.type_name.clone(),
                positions: self.symbols.len() + 1,
                limit: self.limit,
            });
        }
        self.symbols.push(symbol);
        Ok(Term::Leaf(self.symbols.len() - 1))
    }
}

fn has_leaves(particle: &Particle) -> bool {
    match particle {
        Particle::Element(_) | Particle::Wildcard(_) => true,
        Particle::Group(g) => g.particles.iter().any(has_leaves),
    }
}

fn analyze(term: &Term, follow: &mut [BTreeSet<usize>]) -> Facts {
    match term {
        Term::Empty => Facts {
            nullable: true,
            first: BTreeSet::new(),
            last: BTreeSet::new(),
        },
        Term::Leaf(p) => Facts {
            nullable: false,
            first: BTreeSet::from([*p]),
            last: BTreeSet::from([*p]),
        },
        Term::Concat(items) => {
            let mut acc = Facts {
                nullable: true,
                first: BTreeSet::new(),
                last: BTreeSet::new(),
            };
            for item in items {
                let facts = analyze(item, follow);
                for &l in &acc.last {
                    follow[l].extend(facts.first.iter().copied());
                }
                if acc.nullable {
                    acc.first.extend(facts.first.iter().copied());
                }
                acc.last = if facts.nullable {
                    acc.last.union(&facts.last).copied().collect()
                } else {
                    facts.last
                };
                acc.nullable &= facts.nullable;
            }
            acc
        }
        Term::Alt(items) => {
            let mut acc = Facts {
                nullable: false,
                first: BTreeSet::new(),
                last: BTreeSet::new(),
            };
            for item in items {
                let facts = analyze(item, follow);
                acc.nullable |= facts.nullable;
                acc.first.extend(facts.first);
                acc.last.extend(facts.last);
            }
            acc
        }
        Term::Plus(inner) => {
            let facts = analyze(inner, follow);
            for &l in &facts.last {
                follow[l].extend(facts.first.iter().copied());
            }
            facts
        }
        Term::Opt(inner) => Facts {
            nullable: true,
            ..analyze(inner, follow)
        },
    }
}

/// Compiled, deterministic content model of one type
#[derive(Debug, Clone)]
pub struct ContentModel {
    symbols: Vec<Symbol>,
    // states[0] is the start state, states[p + 1] the state after position p.
    states: Vec<State>,
}

impl ContentModel {
    /// Compile `model`, the content model of `type_name`.
    pub fn compile(
        type_name: &QName,
        model: &Particle,
        limits: &Limits,
    ) -> Result<Self, SchemaError> {
        let mut builder = TermBuilder {
            type_name,
            limit: limits.max_model_positions,
            symbols: Vec::new(),
        };
        let term = builder.term(model)?;
        let symbols = builder.symbols;

        let mut follow = vec![BTreeSet::new(); symbols.len()];
        let root = analyze(&term, &mut follow);

        let mut states = Vec::with_capacity(symbols.len() + 1);
        states.push(State {
            accepting: root.nullable,
            candidates: root.first.iter().copied().collect(),
            ..State::default()
        });
        for (p, next) in follow.into_iter().enumerate() {
            states.push(State {
                accepting: root.last.contains(&p),
                candidates: next.into_iter().collect(),
                ..State::default()
            });
        }

        for state in &mut states {
            build_transitions(type_name, &symbols, state)?;
        }
        compute_completions(type_name, &mut states)?;

        tracing::debug!(
            type_name = %type_name,
            positions = symbols.len(),
            "compiled content model"
        );

        Ok(Self { symbols, states })
    }

    /// Number of positions (element or wildcard occurrences) after unrolling
    pub fn position_count(&self) -> usize {
        self.symbols.len()
    }

    /// True if an element with no children satisfies the model
    pub fn is_emptiable(&self) -> bool {
        self.states[0].accepting
    }

    /// Tags accepted as the first child, in declaration order
    pub fn initial_tags(&self) -> Vec<&QName> {
        self.states[0].transitions.keys().collect()
    }

    /// Match an ordered child sequence, attributing every child to a particle.
    pub fn match_children<'t, I>(&self, tags: I) -> Result<Vec<Attribution>, Rejection>
    where
        I: IntoIterator<Item = &'t QName>,
    {
        let mut state = &self.states[0];
        let mut attributions = Vec::new();

        for (position, tag) in tags.into_iter().enumerate() {
            let transition = state.transitions.get(tag).ok_or_else(|| Rejection {
                position,
                kind: RejectionKind::UnexpectedChild {
                    tag: tag.clone(),
                    in_wildcard: state.offers_extension,
                },
            })?;
            attributions.push(transition.attribution);
            state = &self.states[transition.position + 1];
        }

        match state.completion {
            None => Ok(attributions),
            Some(p) => Err(Rejection {
                position: attributions.len(),
                kind: RejectionKind::MissingRequiredChild(self.symbols[p].expected()),
            }),
        }
    }

    /// True if the child sequence is accepted
    pub fn accepts<'t, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'t QName>,
    {
        self.match_children(tags).is_ok()
    }
}

fn build_transitions(
    type_name: &QName,
    symbols: &[Symbol],
    state: &mut State,
) -> Result<(), SchemaError> {
    for &p in &state.candidates {
        let accepted: Vec<(&QName, Attribution)> = match &symbols[p] {
            Symbol::Element { name, type_ref } => vec![(
                name,
                Attribution {
                    type_ref: *type_ref,
                    via: MatchedParticle::Element,
                },
            )],
            Symbol::Wildcard { slots } => {
                state.offers_extension |= !slots.is_empty();
                slots
                    .iter()
                    .map(|(name, type_ref)| {
                        (
                            name,
                            Attribution {
                                type_ref: *type_ref,
                                via: MatchedParticle::Extension,
                            },
                        )
                    })
                    .collect()
            }
        };

        for (tag, attribution) in accepted {
            if state.transitions.contains_key(tag) {
                return Err(SchemaError::AmbiguousContentModel {
                    type_name: type_name.clone(),
                    tag: tag.clone(),
                });
            }
            state.transitions.insert(
                tag.clone(),
                Transition {
                    position: p,
                    attribution,
                },
            );
        }
    }
    Ok(())
}

/// Shortest distance from every state to an accepting one, by reverse BFS;
/// each non-accepting state remembers the candidate that starts its shortest
/// completion (lowest position on ties).
fn compute_completions(type_name: &QName, states: &mut [State]) -> Result<(), SchemaError> {
    let n = states.len();
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (s, state) in states.iter().enumerate() {
        for &p in &state.candidates {
            predecessors[p + 1].push(s);
        }
    }

    let mut distance: Vec<Option<usize>> = vec![None; n];
    let mut queue = VecDeque::new();
    for (s, state) in states.iter().enumerate() {
        if state.accepting {
            distance[s] = Some(0);
            queue.push_back(s);
        }
    }
    while let Some(s) = queue.pop_front() {
        let next = distance[s].map(|d| d + 1);
        for &pred in &predecessors[s] {
            if distance[pred].is_none() {
                distance[pred] = next;
                queue.push_back(pred);
            }
        }
    }

    let mut reachable = vec![false; n];
    let mut stack = vec![0];
    reachable[0] = true;
    while let Some(s) = stack.pop() {
        for &p in &states[s].candidates {
            if !reachable[p + 1] {
                reachable[p + 1] = true;
                stack.push(p + 1);
            }
        }
    }

    for s in 0..n {
        if states[s].accepting {
            continue;
        }
        let best = states[s]
            .candidates
            .iter()
            .filter_map(|&p| distance[p + 1].map(|d| (d, p)))
            .min();
        match best {
            Some((_, p)) => states[s].completion = Some(p),
            None if reachable[s] => {
                return Err(SchemaError::UnsatisfiableContentModel {
                    type_name: type_name.clone(),
                })
            }
            None => {}
        }
    }
    Ok(())
}
