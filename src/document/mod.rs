/*!
 * Document backend for the translation store.
 *
 * A single XML file holds every language and every page:
 *
 * ```xml
 * <translation2>
 *     <languages>
 *         <lang id="fr_FR">
 *             <name>Français</name>
 *             <encoding>iso-8859-1</encoding>
 *         </lang>
 *     </languages>
 *     <pages>
 *         <page key="pets">
 *             <string key="cat">
 *                 <tr lang="fr_FR">Chat</tr>
 *             </string>
 *         </page>
 *     </pages>
 * </translation2>
 * ```
 *
 * The absent and empty page ids are stored under the `#NULL` and `#EMPTY`
 * page keys.
 */

pub mod container;
pub mod index;
pub mod raw;
pub mod writer;

pub use container::DocumentContainer;
pub use index::{DocumentIndex, EMPTY_PAGE, NULL_PAGE};
pub use raw::{RawDocument, RawNode};
pub use writer::to_xml;
