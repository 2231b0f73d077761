//! Part picking: candidate options, pick errors, the pick tree, and the
//! topological picking loop.

use crate::literal::SetLiteral;
use crate::module::{Capability, CapabilityKind, Design, ModuleId, NodeKind};
use crate::solver::{Predicate, Solver};
use crate::tree::PickTree;
use itertools::Itertools;
use log::{debug, error, info, warn};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::env;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::OnceLock;
use thiserror::Error;

/// Collaborator that installs part-specific data onto a module. May be a
/// no-op, as for the remove pseudo-part.
pub trait Supplier {
    /// Attach supplier-specific annotations for the chosen option.
    fn attach(&self, design: &mut Design, module: ModuleId, option: &PickerOption);
}

struct NoSupplier;

impl Supplier for NoSupplier {
    fn attach(&self, _: &mut Design, _: ModuleId, _: &PickerOption) {}
}

/// Concrete purchasable part. Identified by its part number.
#[derive(Clone)]
pub struct Part {
    /// Unique part number.
    pub partno: String,
    /// Supplier able to attach this part.
    pub supplier: Rc<dyn Supplier>,
}

impl Part {
    /// Part sold by `supplier`.
    pub fn new(partno: impl Into<String>, supplier: Rc<dyn Supplier>) -> Self {
        Self {
            partno: partno.into(),
            supplier,
        }
    }

    /// Pseudo-part marking a module that needs no physical part; its
    /// supplier attaches nothing.
    #[must_use]
    pub fn remove() -> Self {
        Self::new("REMOVE", Rc::new(NoSupplier))
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Part").field(&self.partno).finish()
    }
}

impl PartialEq for Part {
    fn eq(&self, other: &Self) -> bool {
        self.partno == other.partno
    }
}

impl Eq for Part {}

impl Hash for Part {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.partno.hash(state);
    }
}

/// Descriptive part metadata keys.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InfoProperty {
    /// Manufacturer name.
    Manufacturer,
    /// Manufacturer part number.
    Partno,
    /// Datasheet URL.
    Datasheet,
}

/// Mapping from logical pin name to the electrical interface it lands on.
pub type Pinmap = Vec<(String, ModuleId)>;

/// Extra applicability test a candidate may carry.
pub type OptionFilter = Rc<dyn Fn(&Design, ModuleId) -> bool>;

/// One candidate binding for a module. Hashed and compared by `part`
/// alone.
#[derive(Clone)]
pub struct PickerOption {
    /// The concrete part.
    pub part: Part,
    /// Parameters that must match for this option to be valid; assumed to
    /// be the narrowest possible values for the part. Keys starting with
    /// `_` are private and never reach the solver.
    pub params: Option<Vec<(String, SetLiteral)>>,
    /// Extra applicability test over the target module.
    pub filter: Option<OptionFilter>,
    /// Pin mapping installed when the option is chosen.
    pub pinmap: Option<Pinmap>,
    /// Manufacturer, part number, and datasheet metadata.
    pub info: Option<Vec<(InfoProperty, String)>>,
}

impl PickerOption {
    /// Option with only a part and no constraints.
    #[must_use]
    pub const fn new(part: Part) -> Self {
        Self {
            part,
            params: None,
            filter: None,
            pinmap: None,
            info: None,
        }
    }

    /// Attach matching parameters.
    #[must_use]
    pub fn with_params(mut self, params: Vec<(String, SetLiteral)>) -> Self {
        self.params = Some(params);
        self
    }

    /// Attach an applicability filter.
    #[must_use]
    pub fn with_filter(mut self, filter: OptionFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Attach a pin mapping.
    #[must_use]
    pub fn with_pinmap(mut self, pinmap: Pinmap) -> Self {
        self.pinmap = Some(pinmap);
        self
    }

    /// Attach descriptive metadata.
    #[must_use]
    pub fn with_info(mut self, info: Vec<(InfoProperty, String)>) -> Self {
        self.info = Some(info);
        self
    }
}

impl fmt::Debug for PickerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|(key, literal)| format!("{key}: {literal}"))
            .join(", ");
        write!(f, "{} {{{params}}}", self.part.partno)
    }
}

impl PartialEq for PickerOption {
    fn eq(&self, other: &Self) -> bool {
        self.part == other.part
    }
}

impl Eq for PickerOption {}

impl Hash for PickerOption {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.part.hash(state);
    }
}

/// Result of a pick decision stored on the module.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PickedPart {
    /// A concrete part was chosen.
    Defined(Part),
    /// The module was marked as not needing a part.
    Remove,
}

impl PickedPart {
    /// The part this decision resolves to.
    #[must_use]
    pub fn part(&self) -> Part {
        match self {
            Self::Defined(part) => part.clone(),
            Self::Remove => Part::remove(),
        }
    }
}

/// Pick routine invoked by the topological picker.
pub type PickFn = dyn Fn(&mut Design, ModuleId, &mut dyn Solver) -> Result<(), PickError>;

/// Picker capability: how a module picks its part.
#[derive(Clone)]
pub struct PickerCap(Rc<PickFn>);

impl PickerCap {
    /// Picker running an arbitrary routine.
    #[must_use]
    pub fn new(pick: Rc<PickFn>) -> Self {
        Self(pick)
    }

    /// Picker that selects among a fixed candidate list by parameter
    /// predicates.
    #[must_use]
    pub fn from_options(options: Vec<PickerOption>) -> Self {
        Self(Rc::new(move |design, module, solver| {
            pick_module_by_params(design, module, solver, &options).map(|_| ())
        }))
    }

    /// Run the pick routine.
    ///
    /// # Errors
    ///
    /// Whatever the routine reports.
    pub fn pick(
        &self,
        design: &mut Design,
        module: ModuleId,
        solver: &mut dyn Solver,
    ) -> Result<(), PickError> {
        (self.0)(design, module, solver)
    }
}

impl fmt::Debug for PickerCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PickerCap")
    }
}

/// Failure to bind a module to a part.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PickError {
    /// Module the failure is about.
    pub module: ModuleId,
    /// Pre-rendered description for upstream formatting.
    pub message: String,
    /// Failure classification.
    pub kind: PickErrorKind,
}

/// Classification of pick failures.
#[derive(Debug)]
pub enum PickErrorKind {
    /// Any other pick failure.
    General,
    /// The module has no picker capability.
    NotImplemented,
    /// No candidate option's parameters are satisfiable.
    Params {
        /// The full candidate list, for diagnostics.
        options: Vec<PickerOption>,
    },
    /// One or more descendants failed.
    Children(Vec<PickError>),
}

impl PickError {
    /// Generic pick failure.
    #[must_use]
    pub fn general(design: &Design, module: ModuleId, message: &str) -> Self {
        Self {
            module,
            message: format!(
                "could not pick part for {}: {message}",
                design.full_name(module)
            ),
            kind: PickErrorKind::General,
        }
    }

    /// The module has no picker.
    #[must_use]
    pub fn not_implemented(design: &Design, module: ModuleId) -> Self {
        Self {
            module,
            message: format!(
                "could not pick part for {}: no picker",
                design.full_name(module)
            ),
            kind: PickErrorKind::NotImplemented,
        }
    }

    /// No candidate option's parameters are satisfiable. The message lists
    /// the module's parameters as the solver sees them and up to five of
    /// the candidate options.
    #[must_use]
    pub fn params(
        design: &Design,
        module: ModuleId,
        options: Vec<PickerOption>,
        solver: &dyn Solver,
    ) -> Self {
        const SHOWN: usize = 5;

        let mut shown = options
            .iter()
            .take(SHOWN)
            .map(|option| format!("    {option:?}"))
            .join("\n");
        if options.len() > SHOWN {
            shown.push_str(&format!("\n    ... and {} more", options.len() - SHOWN));
        }

        let message = format!(
            "could not find part for {}\nwith params:\n{}\nin options:\n{shown}",
            design.full_name(module),
            indent(&design.pretty_params(module, solver)),
        );
        Self {
            module,
            message,
            kind: PickErrorKind::Params { options },
        }
    }

    /// Aggregate failure over descendants.
    #[must_use]
    pub fn children(design: &Design, module: ModuleId, children: Vec<Self>) -> Self {
        let mut result = Self {
            module,
            message: String::new(),
            kind: PickErrorKind::Children(children),
        };
        result.message = format!(
            "could not pick parts for children of {}:\n{}",
            design.full_name(module),
            result
                .leaf_errors()
                .iter()
                .map(|child| format!("{}: caused by {}", design.full_name(child.module), child.message))
                .join("\n"),
        );
        result
    }

    /// Leaf failures, flattening nested child aggregates so callers see
    /// the actual causes instead of nesting noise.
    #[must_use]
    pub fn leaf_errors(&self) -> Vec<&Self> {
        match &self.kind {
            PickErrorKind::Children(children) => children
                .iter()
                .flat_map(|child| child.leaf_errors())
                .collect(),
            _ => vec![self],
        }
    }
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("    {line}")).join("\n")
}

/// Pick a part for `module` by matching the candidates' parameters against
/// the module's parameters through the solver.
///
/// Filters the candidates, builds one conjunction of `Is` predicates per
/// survivor (private `_`-prefixed parameter keys are skipped; no
/// predicates at all make the candidate always valid), asks the solver to
/// assert any of them with the lock set, and picks the first satisfiable
/// option. A chosen pinmap is installed as a capability, the supplier is
/// invoked, and the module is marked picked.
///
/// Returns the chosen option, or `None` when the module already carries a
/// pick decision.
///
/// # Errors
///
/// [`PickErrorKind::Params`] when no candidate survives filtering or none
/// is satisfiable; [`PickErrorKind::General`] when a candidate references
/// an unknown parameter name.
pub fn pick_module_by_params(
    design: &mut Design,
    module: ModuleId,
    solver: &mut dyn Solver,
    options: &[PickerOption],
) -> Result<Option<PickerOption>, PickError> {
    if design.has_capability(module, CapabilityKind::PartPicked) {
        debug!("ignoring already picked module {}", design.full_name(module));
        return Ok(None);
    }

    let params: FxHashMap<String, ModuleId> = design
        .parameters(module)
        .map(|param| (design.name(param).to_owned(), param))
        .collect();

    let design_view: &Design = design;
    let filtered: Vec<&PickerOption> = options
        .iter()
        .filter(|option| {
            option
                .filter
                .as_ref()
                .is_none_or(|filter| filter(design_view, module))
        })
        .collect();

    let mut predicates: Vec<(Predicate, usize)> = Vec::with_capacity(filtered.len());
    for (tag, option) in filtered.iter().enumerate() {
        let mut operands = Vec::new();
        for (key, literal) in option.params.as_deref().unwrap_or_default() {
            if key.starts_with('_') {
                continue;
            }
            let Some(&param) = params.get(key) else {
                return Err(PickError::general(
                    design,
                    module,
                    &format!("unknown parameter `{key}`"),
                ));
            };
            operands.push(Predicate::Is(param, literal.clone()));
        }
        let predicate = if operands.is_empty() {
            // no predicates, thus always-valid option
            Predicate::tautology()
        } else {
            Predicate::And(operands)
        };
        predicates.push((predicate, tag));
    }

    if predicates.is_empty() {
        return Err(PickError::params(design, module, options.to_vec(), solver));
    }

    let result = solver.assert_any_predicate(&predicates, true);
    let Some(&(_, tag)) = result.true_predicates.first() else {
        return Err(PickError::params(design, module, options.to_vec(), solver));
    };

    let option = filtered[tag].clone();
    if let Some(pinmap) = option.pinmap.clone() {
        design.add_capability(module, Capability::PinmapAttach(pinmap));
    }
    option.part.supplier.attach(design, module, &option);
    design.add_capability(
        module,
        Capability::PartPicked(PickedPart::Defined(option.part.clone())),
    );

    debug!(
        "attached {} to {}",
        option.part.partno,
        design.full_name(module)
    );
    Ok(Some(option))
}

/// Build the tree of modules below `module` (inclusive) that require a
/// pick decision.
///
/// Modules that already carry a pick decision are pruned with their whole
/// subtree. Interfaces are transparent containers: their module children
/// surface at the enclosing level. Modules marked skip-self-pick likewise
/// forward their children upwards. Specialisation links are followed
/// before any of this.
#[must_use]
pub fn get_pick_tree(design: &Design, module: ModuleId) -> PickTree {
    let module = if design.kind(module) == NodeKind::Module {
        design.most_special(module)
    } else {
        module
    };

    if design.has_capability(module, CapabilityKind::PartPicked) {
        return PickTree::new();
    }

    let mut merge = PickTree::new();
    for &child in design.children(module) {
        if matches!(design.kind(child), NodeKind::Module | NodeKind::Interface) {
            merge.merge(get_pick_tree(design, child));
        }
    }

    let pickable = design.has_capability(module, CapabilityKind::Picker)
        && !design.has_capability(module, CapabilityKind::SkipSelfPick);
    if pickable && design.kind(module) == NodeKind::Module {
        let mut tree = PickTree::new();
        tree.insert(module, merge);
        tree
    } else {
        merge
    }
}

/// Modules flagged by the pre-flight audit, partitioned by footprint.
#[derive(Debug, Default)]
pub struct MissingPicks {
    /// Unpickable leaves that at least carry a footprint.
    pub with_footprint: Vec<ModuleId>,
    /// Unpickable leaves without a footprint; these will not appear in the
    /// netlist.
    pub without_footprint: Vec<ModuleId>,
}

impl MissingPicks {
    /// True when the audit found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with_footprint.is_empty() && self.without_footprint.is_empty()
    }
}

/// Report leaf modules nothing is going to pick: most-special modules with
/// no module children, no pick decision or picker anywhere up the
/// hierarchy, and no skip-self-pick marker.
pub fn check_missing_picks(design: &Design, root: ModuleId) -> MissingPicks {
    let mut missing = MissingPicks::default();

    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        queue.extend(design.children(node).iter().copied());

        if design.kind(node) != NodeKind::Module {
            continue;
        }
        let module = node;
        let is_leaf = design
            .children_of_kind(module, NodeKind::Module)
            .next()
            .is_none();
        let flagged = is_leaf
            && design.is_most_special(module)
            && design
                .self_or_ancestor_with(module, CapabilityKind::PartPicked)
                .is_none()
            && !design.has_capability(module, CapabilityKind::SkipSelfPick)
            && design
                .self_or_ancestor_with(module, CapabilityKind::Picker)
                .is_none();
        if !flagged {
            continue;
        }
        if design.has_capability(module, CapabilityKind::Footprint) {
            missing.with_footprint.push(module);
        } else {
            missing.without_footprint.push(module);
        }
    }

    if !missing.with_footprint.is_empty() {
        warn!(
            "no pickers for {}",
            full_names(design, &missing.with_footprint)
        );
    }
    if !missing.without_footprint.is_empty() {
        warn!(
            "no pickers and no footprint for {}; these modules will not appear in the netlist",
            full_names(design, &missing.without_footprint)
        );
    }

    missing
}

fn full_names(design: &Design, modules: &[ModuleId]) -> String {
    modules
        .iter()
        .map(|&module| design.full_name(module))
        .join(", ")
}

fn progress_disabled() -> bool {
    static DISABLED: OnceLock<bool> = OnceLock::new();
    *DISABLED.get_or_init(|| env::var_os("PARTSETS_NO_PROGRESS").is_some())
}

/// Progress reporting for a picking run.
///
/// Owns the terminal while active: a single rewritten stderr line tracks
/// completed leaves. Output can be suppressed globally through the
/// `PARTSETS_NO_PROGRESS` environment variable; the advancement
/// bookkeeping stays correct either way.
#[derive(Debug)]
pub struct PickerProgress {
    tree: PickTree,
    total: usize,
    done: usize,
    enabled: bool,
}

impl PickerProgress {
    /// Progress over the leaves of `tree`.
    #[must_use]
    pub fn new(tree: &PickTree) -> Self {
        let total = tree.leaf_count();
        info!("picking parts for {total} leaf modules");
        Self {
            tree: tree.clone(),
            total,
            done: 0,
            enabled: !progress_disabled(),
        }
    }

    /// Progress with terminal output suppressed unconditionally.
    #[must_use]
    pub fn silent(tree: &PickTree) -> Self {
        Self {
            enabled: false,
            ..Self::new(tree)
        }
    }

    /// Record a successful pick of `module` and everything below it; a
    /// module outside the tree or without leaves counts as one.
    pub fn advance(&mut self, module: ModuleId) {
        let leaves = self
            .tree
            .subtree(module)
            .map_or(0, PickTree::leaf_count)
            .max(1);
        self.done += leaves;
        if self.enabled {
            eprint!("\rpicking {}/{}", self.done, self.total);
        }
    }

    /// Completed leaf count so far.
    #[must_use]
    pub const fn done(&self) -> usize {
        self.done
    }

    /// Total leaf count.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Close the progress line and release the terminal.
    pub fn finish(&self) {
        if self.enabled {
            eprintln!();
        }
    }
}

/// Drive pick attempts across the tree.
///
/// Entries are processed most-recently-inserted first. A failed pick over
/// a non-empty subtree recovers by splicing the children into the working
/// set: the part could not be picked at that abstraction level, so the
/// more concrete children are tried instead. A failed pick at a leaf
/// propagates.
///
/// # Errors
///
/// The first unrecoverable [`PickError`], or
/// [`PickErrorKind::NotImplemented`] for a tree entry without a picker
/// capability.
pub fn pick_topologically(
    design: &mut Design,
    tree: PickTree,
    solver: &mut dyn Solver,
    progress: &mut PickerProgress,
) -> Result<(), PickError> {
    debug!("picking parts for {} top-level modules", tree.len());

    let mut candidates = tree;
    while let Some((module, subtree)) = candidates.pop() {
        let picker = match design.capability(module, CapabilityKind::Picker) {
            Some(Capability::Picker(picker)) => picker.clone(),
            _ => return Err(PickError::not_implemented(design, module)),
        };
        match picker.pick(design, module, solver) {
            Ok(()) => progress.advance(module),
            Err(pick_error) => {
                if subtree.is_empty() {
                    return Err(pick_error);
                }
                warn!(
                    "could not pick {} ({pick_error}); descending into {} children",
                    design.full_name(module),
                    subtree.len()
                );
                candidates.merge(subtree);
            }
        }
    }

    debug!("done picking");
    Ok(())
}

/// Build the pick tree for `root`, audit it for unpickable leaves, and
/// pick every module in it.
///
/// # Errors
///
/// Re-raises the first unrecovered [`PickError`]. Aggregate child failures
/// are logged per leaf module, with the failing module's parameters, before
/// the aggregate is re-raised.
pub fn pick_part_recursively(
    design: &mut Design,
    root: ModuleId,
    solver: &mut dyn Solver,
) -> Result<(), PickError> {
    let tree = get_pick_tree(design, root);
    debug!("pick tree: {tree:?}");

    check_missing_picks(design, root);

    let mut progress = PickerProgress::new(&tree);
    let outcome = pick_topologically(design, tree, solver, &mut progress);
    progress.finish();

    if let Err(aggregate) = &outcome {
        if matches!(aggregate.kind, PickErrorKind::Children(_)) {
            for leaf in aggregate.leaf_errors() {
                error!(
                    "could not find pick for {}:\n{}\nparams:\n{}",
                    design.full_name(leaf.module),
                    leaf.message,
                    indent(&design.pretty_params(leaf.module, solver)),
                );
            }
        }
    }

    outcome
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interval::Interval;
    use crate::solver::testing::MapSolver;
    use crate::union::IntervalUnion;
    use std::cell::RefCell;

    fn union(lo: f64, hi: f64) -> IntervalUnion {
        IntervalUnion::from(Interval::new(lo, hi).unwrap())
    }

    /// Supplier recording every attach call.
    #[derive(Default)]
    struct RecordingSupplier {
        attached: RefCell<Vec<String>>,
    }

    impl Supplier for RecordingSupplier {
        fn attach(&self, _: &mut Design, _: ModuleId, option: &PickerOption) {
            self.attached.borrow_mut().push(option.part.partno.clone());
        }
    }

    fn option(supplier: &Rc<RecordingSupplier>, partno: &str) -> PickerOption {
        PickerOption::new(Part::new(partno, Rc::clone(supplier) as Rc<dyn Supplier>))
    }

    fn failing_picker(message: &'static str) -> PickerCap {
        PickerCap::new(Rc::new(
            move |design: &mut Design, module: ModuleId, _: &mut dyn Solver| {
                Err(PickError::general(design, module, message))
            },
        ))
    }

    #[test]
    fn pick_tree_keeps_pickable_modules_only() {
        let mut design = Design::new();
        let root = design.add_module(None, "root");
        let picker_child = design.add_module(Some(root), "picker_child");
        design.add_module(Some(root), "plain_child");

        design.add_capability(root, Capability::Picker(PickerCap::from_options(vec![])));
        design.add_capability(
            picker_child,
            Capability::Picker(PickerCap::from_options(vec![])),
        );

        let tree = get_pick_tree(&design, root);
        assert_eq!(tree.top_level().collect::<Vec<_>>(), [root]);
        let subtree = tree.subtree(root).unwrap();
        assert_eq!(subtree.top_level().collect::<Vec<_>>(), [picker_child]);
        assert!(subtree.subtree(picker_child).unwrap().is_empty());
    }

    #[test]
    fn pick_tree_prunes_picked_and_descends_interfaces() {
        let mut design = Design::new();
        let root = design.add_module(None, "root");
        let picked = design.add_module(Some(root), "picked");
        design.add_capability(picked, Capability::Picker(PickerCap::from_options(vec![])));
        design.mark_no_pick_needed(picked);

        let bus = design.add_interface(root, "bus");
        let nested = design.add_module(Some(bus), "nested");
        design.add_capability(nested, Capability::Picker(PickerCap::from_options(vec![])));

        let tree = get_pick_tree(&design, root);
        // the picked module is pruned; the module behind the interface
        // surfaces at the top level
        assert_eq!(tree.top_level().collect::<Vec<_>>(), [nested]);
    }

    #[test]
    fn pick_tree_skip_self_pick_forwards_children() {
        let mut design = Design::new();
        let root = design.add_module(None, "root");
        let container = design.add_module(Some(root), "container");
        design.add_capability(
            container,
            Capability::Picker(PickerCap::from_options(vec![])),
        );
        design.add_capability(container, Capability::SkipSelfPick);
        let inner = design.add_module(Some(container), "inner");
        design.add_capability(inner, Capability::Picker(PickerCap::from_options(vec![])));

        let tree = get_pick_tree(&design, root);
        assert_eq!(tree.top_level().collect::<Vec<_>>(), [inner]);
    }

    #[test]
    fn pick_tree_follows_specialisation() {
        let mut design = Design::new();
        let general = design.add_module(None, "resistor");
        let special = design.add_module(None, "thin_film");
        design.add_capability(special, Capability::Picker(PickerCap::from_options(vec![])));
        design.specialize(general, special);

        let tree = get_pick_tree(&design, general);
        assert_eq!(tree.top_level().collect::<Vec<_>>(), [special]);
    }

    #[test]
    fn params_pick_attaches_part_and_marks_module() {
        let mut design = Design::new();
        let module = design.add_module(None, "r1");
        let resistance = design.add_parameter(module, "resistance");

        let mut solver = MapSolver::default();
        solver.constrain(resistance, union(9_000.0, 11_000.0));

        let supplier = Rc::new(RecordingSupplier::default());
        let options = vec![
            option(&supplier, "RC0402-1k")
                .with_params(vec![("resistance".to_owned(), union(1_000.0, 1_000.0).into())]),
            option(&supplier, "RC0402-10k")
                .with_params(vec![("resistance".to_owned(), union(10_000.0, 10_000.0).into())])
                .with_info(vec![(InfoProperty::Manufacturer, "Yageo".to_owned())]),
        ];

        let picked = pick_module_by_params(&mut design, module, &mut solver, &options)
            .unwrap()
            .unwrap();
        assert_eq!(picked.part.partno, "RC0402-10k");
        assert!(picked.info.is_some());
        assert_eq!(supplier.attached.borrow().as_slice(), ["RC0402-10k"]);
        assert!(design.has_capability(module, CapabilityKind::PartPicked));
        // the solver committed the chosen disjunct
        assert!(solver.domain(resistance).unwrap().contains(10_000.0));
        assert!(!solver.domain(resistance).unwrap().contains(9_500.0));
    }

    #[test]
    fn params_pick_is_a_noop_when_already_picked() {
        let mut design = Design::new();
        let module = design.add_module(None, "r1");
        design.mark_no_pick_needed(module);

        let supplier = Rc::new(RecordingSupplier::default());
        let mut solver = MapSolver::default();
        let options = vec![option(&supplier, "RC0402-10k")];
        let picked = pick_module_by_params(&mut design, module, &mut solver, &options).unwrap();
        assert!(picked.is_none());
        assert!(supplier.attached.borrow().is_empty());
    }

    #[test]
    fn params_pick_skips_private_keys_and_respects_filters() {
        let mut design = Design::new();
        let module = design.add_module(None, "r1");

        let supplier = Rc::new(RecordingSupplier::default());
        let mut solver = MapSolver::default();

        // `_sku` is private: no predicate is built for it, so the option
        // is always valid even though no such parameter exists
        let rejected = option(&supplier, "never").with_filter(Rc::new(|_, _| false));
        let accepted = option(&supplier, "always")
            .with_params(vec![("_sku".to_owned(), SetLiteral::from(17.0))]);
        let picked = pick_module_by_params(&mut design, module, &mut solver, &[rejected, accepted])
            .unwrap()
            .unwrap();
        assert_eq!(picked.part.partno, "always");
    }

    #[test]
    fn params_pick_fails_without_candidates() {
        let mut design = Design::new();
        let module = design.add_module(None, "r1");

        let supplier = Rc::new(RecordingSupplier::default());
        let mut solver = MapSolver::default();
        let rejected = option(&supplier, "never").with_filter(Rc::new(|_, _| false));
        let error = pick_module_by_params(&mut design, module, &mut solver, &[rejected])
            .unwrap_err();
        assert!(matches!(error.kind, PickErrorKind::Params { ref options } if options.len() == 1));
    }

    #[test]
    fn params_pick_fails_when_nothing_is_satisfiable() {
        let mut design = Design::new();
        let module = design.add_module(None, "r1");
        let resistance = design.add_parameter(module, "resistance");

        let mut solver = MapSolver::default();
        solver.constrain(resistance, union(9_000.0, 11_000.0));

        let supplier = Rc::new(RecordingSupplier::default());
        let options = vec![
            option(&supplier, "RC0402-1k")
                .with_params(vec![("resistance".to_owned(), union(1_000.0, 1_000.0).into())]),
        ];
        let error = pick_module_by_params(&mut design, module, &mut solver, &options).unwrap_err();
        assert!(matches!(error.kind, PickErrorKind::Params { .. }));
        assert!(error.message.contains("could not find part for r1"));
        assert!(!design.has_capability(module, CapabilityKind::PartPicked));
    }

    #[test]
    fn params_pick_rejects_unknown_parameter_names() {
        let mut design = Design::new();
        let module = design.add_module(None, "r1");

        let supplier = Rc::new(RecordingSupplier::default());
        let mut solver = MapSolver::default();
        let options = vec![
            option(&supplier, "RC0402-1k")
                .with_params(vec![("inductance".to_owned(), SetLiteral::from(1.0))]),
        ];
        let error = pick_module_by_params(&mut design, module, &mut solver, &options).unwrap_err();
        assert!(matches!(error.kind, PickErrorKind::General));
        assert!(error.message.contains("unknown parameter"));
    }

    #[test]
    fn params_pick_installs_pinmap() {
        let mut design = Design::new();
        let module = design.add_module(None, "r1");
        let p1 = design.add_interface(module, "p1");
        let p2 = design.add_interface(module, "p2");

        let supplier = Rc::new(RecordingSupplier::default());
        let mut solver = MapSolver::default();
        let options = vec![option(&supplier, "RC0402-10k")
            .with_pinmap(vec![("1".to_owned(), p1), ("2".to_owned(), p2)])];
        pick_module_by_params(&mut design, module, &mut solver, &options).unwrap();

        let Some(Capability::PinmapAttach(pinmap)) =
            design.capability(module, CapabilityKind::PinmapAttach)
        else {
            panic!("pinmap capability missing");
        };
        assert_eq!(pinmap.len(), 2);
    }

    #[test]
    fn topological_pick_recovers_by_descending() {
        let mut design = Design::new();
        let root = design.add_module(None, "amp");
        let left = design.add_module(Some(root), "left");
        let right = design.add_module(Some(root), "right");

        let supplier = Rc::new(RecordingSupplier::default());
        design.add_capability(root, Capability::Picker(failing_picker("no whole-amp part")));
        design.add_capability(
            left,
            Capability::Picker(PickerCap::from_options(vec![option(&supplier, "L1")])),
        );
        design.add_capability(
            right,
            Capability::Picker(PickerCap::from_options(vec![option(&supplier, "R1")])),
        );

        let tree = get_pick_tree(&design, root);
        assert_eq!(tree.leaf_count(), 2);

        let mut solver = MapSolver::default();
        let mut progress = PickerProgress::silent(&tree);
        pick_topologically(&mut design, tree, &mut solver, &mut progress).unwrap();

        // the whole-module failure was recovered leaf by leaf
        assert_eq!(progress.done(), 2);
        assert_eq!(progress.total(), 2);
        assert!(design.has_capability(left, CapabilityKind::PartPicked));
        assert!(design.has_capability(right, CapabilityKind::PartPicked));
        assert!(!design.has_capability(root, CapabilityKind::PartPicked));
    }

    #[test]
    fn topological_pick_rethrows_at_leaves() {
        let mut design = Design::new();
        let root = design.add_module(None, "amp");
        design.add_capability(root, Capability::Picker(failing_picker("nothing fits")));

        let tree = get_pick_tree(&design, root);
        let mut solver = MapSolver::default();
        let mut progress = PickerProgress::silent(&tree);
        let error =
            pick_topologically(&mut design, tree, &mut solver, &mut progress).unwrap_err();
        assert!(matches!(error.kind, PickErrorKind::General));
        assert_eq!(progress.done(), 0);
    }

    #[test]
    fn successful_whole_module_pick_advances_by_leaf_count() {
        let mut design = Design::new();
        let root = design.add_module(None, "amp");
        let left = design.add_module(Some(root), "left");
        let right = design.add_module(Some(root), "right");

        let supplier = Rc::new(RecordingSupplier::default());
        design.add_capability(
            root,
            Capability::Picker(PickerCap::from_options(vec![option(&supplier, "AMP-1")])),
        );
        for module in [left, right] {
            design.add_capability(
                module,
                Capability::Picker(PickerCap::from_options(vec![option(&supplier, "X")])),
            );
        }

        let tree = get_pick_tree(&design, root);
        let mut solver = MapSolver::default();
        let mut progress = PickerProgress::silent(&tree);
        pick_topologically(&mut design, tree, &mut solver, &mut progress).unwrap();

        // picking the whole module counts its two leaves at once
        assert_eq!(progress.done(), 2);
        assert!(design.has_capability(root, CapabilityKind::PartPicked));
        assert!(!design.has_capability(left, CapabilityKind::PartPicked));
    }

    #[test]
    fn missing_pick_audit_partitions_by_footprint() {
        let mut design = Design::new();
        let root = design.add_module(None, "board");

        let bare = design.add_module(Some(root), "bare");
        let with_fp = design.add_module(Some(root), "with_fp");
        design.add_capability(with_fp, Capability::Footprint);

        let covered = design.add_module(Some(root), "covered");
        design.add_capability(
            covered,
            Capability::Picker(PickerCap::from_options(vec![])),
        );
        let skipped = design.add_module(Some(root), "skipped");
        design.add_capability(skipped, Capability::SkipSelfPick);

        let missing = check_missing_picks(&design, root);
        assert_eq!(missing.with_footprint, [with_fp]);
        assert_eq!(missing.without_footprint, [bare]);
        assert!(!missing.is_empty());
    }

    #[test]
    fn child_errors_flatten_to_leaves() {
        let mut design = Design::new();
        let root = design.add_module(None, "root");
        let a = design.add_module(Some(root), "a");
        let b = design.add_module(Some(root), "b");
        let c = design.add_module(Some(b), "c");

        let leaf_a = PickError::general(&design, a, "no part");
        let leaf_c = PickError::general(&design, c, "no part");
        let nested = PickError::children(&design, b, vec![leaf_c]);
        let aggregate = PickError::children(&design, root, vec![leaf_a, nested]);

        let leaves: Vec<ModuleId> = aggregate
            .leaf_errors()
            .iter()
            .map(|leaf| leaf.module)
            .collect();
        assert_eq!(leaves, [a, c]);
        assert!(aggregate.message.contains("root.a"));
        assert!(aggregate.message.contains("root.b.c"));
    }

    #[test]
    fn pick_part_recursively_end_to_end() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut design = Design::new();
        let root = design.add_module(None, "board");
        let r1 = design.add_module(Some(root), "r1");
        let resistance = design.add_parameter(r1, "resistance");
        let c1 = design.add_module(Some(root), "c1");

        let supplier = Rc::new(RecordingSupplier::default());
        design.add_capability(
            r1,
            Capability::Picker(PickerCap::from_options(vec![
                option(&supplier, "RC0402-1k").with_params(vec![(
                    "resistance".to_owned(),
                    union(1_000.0, 1_000.0).into(),
                )]),
                option(&supplier, "RC0402-10k").with_params(vec![(
                    "resistance".to_owned(),
                    union(10_000.0, 10_000.0).into(),
                )]),
            ])),
        );
        design.add_capability(
            c1,
            Capability::Picker(PickerCap::from_options(vec![option(&supplier, "C0402")])),
        );

        let mut solver = MapSolver::default();
        // 10 kOhm +- 5%, so only the second resistor option fits
        solver.constrain(resistance, union(9_500.0, 10_500.0));

        pick_part_recursively(&mut design, root, &mut solver).unwrap();
        assert!(design.has_capability(r1, CapabilityKind::PartPicked));
        assert!(design.has_capability(c1, CapabilityKind::PartPicked));
        let attached = supplier.attached.borrow();
        assert!(attached.contains(&"RC0402-10k".to_owned()));
        assert!(attached.contains(&"C0402".to_owned()));
    }
}
