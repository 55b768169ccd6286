//! Long help text constants for CLI subcommands.
//!
//! Extracted from `cli.rs` to keep the argument definitions concise.

/// Inspection report diff, threshold check and attribution.
pub const INSPECTIONS: &str = "\
Compare two inspection reports and show which issues were introduced and
which were removed.

Issues are identified by file and message, not by line: an issue that moves
inside its file is unchanged, an issue whose message changes is one removal
plus one introduction. When the same message appears several times in one
file, the n-th occurrence is matched with the n-th occurrence.

A missing former report is an empty baseline (first run).

Threshold file (--threshold), semicolon separated:
  Project;InspectionsThreshold
  Core;120
  Web;40
Projects with more issues than their threshold are listed.

Attribution (requires git):
  --head H            credit introduced issues to the authors of their lines
                      at commit H (1 point per warning, 10 per error)
  --base B --head H   also credit removed issues to the authors of the
                      commits that removed them between B and H

Examples:
  inspecta inspections --former base.xml --current new.xml
  inspecta inspections --former base.xml --current new.xml --threshold t.csv
  inspecta inspections --former base.xml --current new.xml --base abc --head def --top 3";

/// Duplicate report diff and attribution.
pub const DUPLICATES: &str = "\
Compare two duplicate-code reports and show which duplicates were introduced
and which were removed.

A duplicate is identified by the files of its fragments and the text they
hold, so a duplicate that only moved is unchanged.

Attribution (requires git) works as for inspections; each fragment of a
duplicate is worth the duplicate's cost divided by its number of fragments.

Examples:
  inspecta duplicates --former base.xml --current new.xml
  inspecta duplicates --former base.xml --current new.xml --head def --json";

/// Branch derivation from the trunk.
pub const DERIVATION: &str = "\
Check how long ago each branch last merged the trunk branch.

The merge base of <remote>/<branch> and <remote>/<trunk> is the most recent
trunk commit contained in the branch. A branch is DERIVED when that commit
is older than --max-days days.

Examples:
  inspecta derivation feature/login --fetch
  inspecta derivation feature/a feature/b --max-days 14 --json";

/// Snapshot rotation.
pub const PROMOTE: &str = "\
Make the current report the new baseline.

When --archive is given and the former report exists, it is first copied to
<archive>/<name>-<yyyy_mm_dd of yesterday>.xml. The current report is then
copied over the former one.

Examples:
  inspecta promote --former base/inspections.xml --current inspections.xml --archive history/";
